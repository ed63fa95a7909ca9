//! One day's patch session
//!
//! [`Session`] owns today's grid, the snapshot store, the clock and the
//! presenter. Input events become plain method calls; every change is pushed
//! back to the presenter as a notification. Nothing here blocks or defers.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::calendar::{Clock, DateKey};
use crate::grid::Grid;
use crate::history::{self, HistoryEntry};
use crate::settings::Settings;
use crate::snapshot::SnapshotStore;
use crate::storage::KeyValueStore;

/// Whether today's grid matches what is stored. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Saved,
    Unsaved,
}

impl SaveState {
    pub fn label(&self) -> &'static str {
        match self {
            SaveState::Saved => "Saved for today",
            SaveState::Unsaved => "Unsaved live patch",
        }
    }
}

/// Status line contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub stitched: usize,
    pub save_state: SaveState,
}

impl Status {
    pub fn stitched_label(&self) -> String {
        format!("{} stitched cells", self.stitched)
    }
}

/// Placeholder shown when there is no history
pub const EMPTY_HISTORY_LABEL: &str = "No previous patches yet.";

/// Receives state changes from a [`Session`]
///
/// All methods default to no-ops so a presenter only implements what it draws.
pub trait Presenter {
    /// The session's day was pinned (start) or rolled over
    fn day_changed(&mut self, _today: DateKey) {}

    /// A single cell changed
    fn cell_changed(&mut self, _row: usize, _col: usize, _value: u8) {}

    /// The whole grid needs redrawing
    fn grid_replaced(&mut self, _grid: &Grid) {}

    fn status_changed(&mut self, _status: &Status) {}

    /// History strip contents; empty means show the placeholder
    fn history_ready(&mut self, _entries: &[HistoryEntry]) {}
}

/// Presenter that draws nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

/// Today's patch plus everything needed to persist and display it
pub struct Session<S, C, P> {
    grid: Grid,
    today: DateKey,
    save_state: SaveState,
    history: Vec<HistoryEntry>,
    snapshots: SnapshotStore<S>,
    clock: C,
    settings: Settings,
    presenter: P,
    rng: Pcg32,
}

impl<S: KeyValueStore, C: Clock, P: Presenter> Session<S, C, P> {
    /// Pin today, load today's snapshot (if any), render, and build history
    pub fn start(store: S, clock: C, settings: Settings, presenter: P, seed: u64) -> Self {
        let snapshots = SnapshotStore::with_prefix(store, settings.storage_prefix.clone());
        let today = clock.today();
        let mut session = Self {
            grid: Grid::new(),
            today,
            save_state: SaveState::Unsaved,
            history: Vec::new(),
            snapshots,
            clock,
            settings,
            presenter,
            rng: Pcg32::seed_from_u64(seed),
        };
        log::info!("Patch session started for {}", today);
        session.load_today();
        session.rebuild_history();
        session
    }

    fn load_today(&mut self) {
        match self.snapshots.load(self.today) {
            Some(grid) => {
                log::info!("Loaded patch for {} ({} stitched)", self.today, grid.count_non_zero());
                self.grid = grid;
                self.save_state = SaveState::Saved;
            }
            None => {
                self.grid = Grid::new();
                self.save_state = SaveState::Unsaved;
            }
        }
        self.presenter.day_changed(self.today);
        self.presenter.grid_replaced(&self.grid);
        self.notify_status();
    }

    fn notify_status(&mut self) {
        let status = self.status();
        self.presenter.status_changed(&status);
    }

    fn mark_unsaved(&mut self) {
        self.save_state = SaveState::Unsaved;
        self.notify_status();
    }

    /// Recompute the history strip and hand it to the presenter
    pub fn rebuild_history(&mut self) {
        self.history = history::recent(
            &self.snapshots,
            self.today,
            self.settings.history_lookback_days,
            self.settings.history_max_entries,
        );
        self.presenter.history_ready(&self.history);
    }

    /// A cell was clicked: advance it one state
    pub fn cell_clicked(&mut self, row: usize, col: usize) -> u8 {
        let value = self.grid.cycle_cell(row, col);
        self.presenter.cell_changed(row, col, value);
        self.mark_unsaved();
        value
    }

    /// Fill the grid with a random patch
    pub fn randomize(&mut self) {
        self.grid.randomize(&mut self.rng);
        log::debug!("Randomized patch ({} stitched)", self.grid.count_non_zero());
        self.presenter.grid_replaced(&self.grid);
        self.mark_unsaved();
    }

    /// Empty the grid and delete today's snapshot
    pub fn clear(&mut self) {
        self.grid.clear();
        self.presenter.grid_replaced(&self.grid);
        self.mark_unsaved();
        self.snapshots.remove(self.today);
    }

    /// Persist today's grid.
    ///
    /// An empty grid is never written; its snapshot is removed instead.
    /// Returns whether a snapshot now holds the grid.
    pub fn save(&mut self) -> bool {
        if self.grid.is_empty() {
            log::info!("Nothing stitched for {}, removing stored patch", self.today);
            self.snapshots.remove(self.today);
            self.mark_unsaved();
            return false;
        }
        if !self.snapshots.save(self.today, &self.grid) {
            return false;
        }
        self.save_state = SaveState::Saved;
        self.notify_status();
        true
    }

    fn autosave(&mut self, reason: &str) -> bool {
        if !self.settings.autosave || self.grid.is_empty() {
            log::debug!("Skipping autosave on {}", reason);
            return false;
        }
        log::debug!("Autosave on {}", reason);
        self.save()
    }

    /// The page became hidden
    pub fn became_hidden(&mut self) -> bool {
        self.autosave("hide")
    }

    /// The page is about to unload
    pub fn about_to_unload(&mut self) -> bool {
        self.autosave("unload")
    }

    /// Follow the clock into a new day.
    ///
    /// The old day is autosaved first, then the new day is loaded and the
    /// history rebuilt. Returns whether the day changed.
    pub fn refresh_day(&mut self) -> bool {
        let now = self.clock.today();
        if now == self.today {
            return false;
        }
        log::info!("Day rolled over from {} to {}", self.today, now);
        self.autosave("day change");
        self.today = now;
        self.load_today();
        self.rebuild_history();
        true
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn today(&self) -> DateKey {
        self.today
    }

    pub fn save_state(&self) -> SaveState {
        self.save_state
    }

    pub fn status(&self) -> Status {
        Status {
            stitched: self.grid.count_non_zero(),
            save_state: self.save_state,
        }
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn snapshots(&self) -> &SnapshotStore<S> {
        &self.snapshots
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }
}
