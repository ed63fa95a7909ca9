//! Day-keyed patch snapshots
//!
//! Each day's patch is stored as a JSON array of arrays under
//! `<prefix><YYYY-MM-DD>`. Stored data is untrusted: it may have been edited
//! by hand, written by an older build, or truncated. Loading never fails
//! loudly:
//! - wrong outer shape (not an array of `GRID_SIZE` rows) -> no snapshot
//! - a malformed row -> that row becomes all zeros, the rest is kept
//! - each cell is coerced to a number; non-finite -> 0, else clamped to
//!   `0..=MAX_STATE`
//!
//! Storage failures are logged and reported as "nothing saved" / "nothing
//! loaded"; they never reach the caller as errors.

use serde_json::Value;

use crate::calendar::DateKey;
use crate::consts::*;
use crate::grid::{Grid, Row};
use crate::storage::KeyValueStore;

/// Snapshot persistence over any key-value backend
#[derive(Debug, Clone)]
pub struct SnapshotStore<S> {
    store: S,
    prefix: String,
}

impl<S: KeyValueStore> SnapshotStore<S> {
    /// Store using the default `patch-pattern:` namespace
    pub fn new(store: S) -> Self {
        Self::with_prefix(store, STORAGE_PREFIX)
    }

    pub fn with_prefix(store: S, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Storage key for a day
    pub fn storage_key(&self, date: DateKey) -> String {
        format!("{}{}", self.prefix, date)
    }

    /// Write `grid` as the snapshot for `date`, replacing any previous one.
    ///
    /// Returns whether the write landed. Failures are logged.
    pub fn save(&mut self, date: DateKey, grid: &Grid) -> bool {
        let json = match serde_json::to_string(grid) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize patch for {}: {}", date, e);
                return false;
            }
        };
        let key = self.storage_key(date);
        match self.store.set_item(&key, &json) {
            Ok(()) => {
                log::debug!("Saved patch for {} ({} stitched)", date, grid.count_non_zero());
                true
            }
            Err(e) => {
                log::error!("Failed to save patch for {}: {}", date, e);
                false
            }
        }
    }

    /// Read the snapshot for `date`, repairing what can be repaired
    pub fn load(&self, date: DateKey) -> Option<Grid> {
        let key = self.storage_key(date);
        let raw = match self.store.get_item(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::error!("Failed to load patch for {}: {}", date, e);
                return None;
            }
        };
        let grid = parse_snapshot(&raw);
        if grid.is_none() {
            log::warn!("Discarding malformed patch stored for {}", date);
        }
        grid
    }

    /// Delete the snapshot for `date`; an absent snapshot is fine.
    ///
    /// Returns whether storage accepted the delete. Failures are logged.
    pub fn remove(&mut self, date: DateKey) -> bool {
        let key = self.storage_key(date);
        match self.store.remove_item(&key) {
            Ok(()) => {
                log::debug!("Removed patch for {}", date);
                true
            }
            Err(e) => {
                log::error!("Failed to clear patch for {}: {}", date, e);
                false
            }
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

/// Parse and sanitize a stored snapshot value
pub fn parse_snapshot(raw: &str) -> Option<Grid> {
    if raw.is_empty() {
        return None;
    }
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            log::debug!("Stored patch is not JSON: {}", e);
            return None;
        }
    };
    sanitize(&value)
}

/// Turn an arbitrary JSON value into a grid, or `None` if the outer shape is wrong
pub fn sanitize(value: &Value) -> Option<Grid> {
    let rows = value.as_array()?;
    if rows.len() != GRID_SIZE {
        return None;
    }
    let mut cells = [[0u8; GRID_SIZE]; GRID_SIZE];
    for (dst, src) in cells.iter_mut().zip(rows) {
        *dst = sanitize_row(src);
    }
    Some(Grid::from_rows(cells))
}

fn sanitize_row(value: &Value) -> Row {
    let mut row = [0u8; GRID_SIZE];
    if let Some(cells) = value.as_array().filter(|cells| cells.len() == GRID_SIZE) {
        for (dst, src) in row.iter_mut().zip(cells) {
            *dst = sanitize_cell(src);
        }
    }
    row
}

fn sanitize_cell(value: &Value) -> u8 {
    let n = coerce_number(value);
    if !n.is_finite() {
        return 0;
    }
    n.clamp(0.0, f64::from(MAX_STATE)) as u8
}

/// Numeric reading of a JSON value, NaN when it has none.
///
/// Follows how a browser reads loosely typed storage: booleans are 0/1,
/// null and blank strings are 0, numeric strings parse.
fn coerce_number(value: &Value) -> f64 {
    match value {
        // Literal text, so `1e400` reads as infinity instead of failing
        Value::Number(n) => n.to_string().parse().unwrap_or(f64::NAN),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::String(s) => parse_numeric_str(s),
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

/// String to number: blank is 0, `0x`/`0o`/`0b` prefixes are integers in
/// that radix (unsigned), anything else is a decimal float or NaN
fn parse_numeric_str(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    let radix = match s.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("0x") => 16,
        Some("0o") => 8,
        Some("0b") => 2,
        _ => return s.parse().unwrap_or(f64::NAN),
    };
    let digits = &s[2..];
    if digits.is_empty() {
        return f64::NAN;
    }
    digits
        .chars()
        .try_fold(0.0f64, |acc, c| {
            c.to_digit(radix)
                .map(|d| acc * f64::from(radix) + f64::from(d))
        })
        .unwrap_or(f64::NAN)
}
