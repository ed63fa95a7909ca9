//! The patch grid
//!
//! A fixed `GRID_SIZE` x `GRID_SIZE` matrix of cell states in `0..=MAX_STATE`.
//! The shape is carried by the array type, so a `Grid` is always well formed;
//! stored data that does not fit is repaired in `snapshot` before it gets here.

use std::fmt;

use rand::Rng;
use serde::Serialize;

use crate::consts::*;

/// One row of cells
pub type Row = [u8; GRID_SIZE];

/// A patch: `GRID_SIZE` rows of `GRID_SIZE` cell states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Grid {
    cells: [Row; GRID_SIZE],
}

impl Grid {
    /// All-zero patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from rows, clamping every value to `MAX_STATE`
    pub fn from_rows(rows: [Row; GRID_SIZE]) -> Self {
        let mut cells = rows;
        for row in cells.iter_mut() {
            for v in row.iter_mut() {
                *v = (*v).min(MAX_STATE);
            }
        }
        Self { cells }
    }

    pub fn rows(&self) -> &[Row; GRID_SIZE] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row][col]
    }

    /// Set a cell, clamping to `MAX_STATE`
    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        self.cells[row][col] = value.min(MAX_STATE);
    }

    /// Advance a cell to its next state (3 wraps to 0) and return the new value.
    ///
    /// Indices are trusted; out-of-range indices panic like slice indexing.
    pub fn cycle_cell(&mut self, row: usize, col: usize) -> u8 {
        let cell = &mut self.cells[row][col];
        *cell = (*cell + 1) % (MAX_STATE + 1);
        *cell
    }

    /// Fill every cell independently from the stitch distribution
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for row in self.cells.iter_mut() {
            for cell in row.iter_mut() {
                *cell = roll_state(rng.random::<f64>());
            }
        }
    }

    /// Reset every cell to 0
    pub fn clear(&mut self) {
        self.cells = [[0; GRID_SIZE]; GRID_SIZE];
    }

    /// Number of stitched (non-zero) cells
    pub fn count_non_zero(&self) -> usize {
        self.cells.iter().flatten().filter(|&&v| v != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count_non_zero() == 0
    }
}

/// Map a uniform roll in `[0, 1)` to a cell state
fn roll_state(roll: f64) -> u8 {
    RANDOM_THRESHOLDS
        .iter()
        .position(|&t| roll < t)
        .map(|i| i as u8)
        .unwrap_or(MAX_STATE)
}

/// Glyph used for a cell state in text output
pub fn state_glyph(value: u8) -> char {
    match value {
        0 => '·',
        1 => '░',
        2 => '▒',
        _ => '▓',
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for &v in row {
                write!(f, "{}", state_glyph(v))?;
            }
        }
        Ok(())
    }
}
