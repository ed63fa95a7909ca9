//! Daily Patch - a 6x6 stitch patch, one per calendar day
//!
//! Core modules:
//! - `grid`: The in-memory patch and its mutations
//! - `calendar`: Date keys and the injected clock
//! - `storage`: Key-value backends (memory, JSON file, LocalStorage)
//! - `snapshot`: Day-keyed persistence with sanitization of stored data
//! - `history`: Bounded most-recent-first view over prior days
//! - `session`: Owns one day's patch and drives the presenter
//! - `settings`: Persisted preferences

pub mod calendar;
pub mod grid;
pub mod history;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod storage;

pub use calendar::{Clock, DateKey, FixedClock, SystemClock};
pub use grid::Grid;
pub use history::{HistoryEntry, recent};
pub use session::{NullPresenter, Presenter, SaveState, Session, Status};
pub use settings::Settings;
pub use snapshot::SnapshotStore;
pub use storage::{KeyValueStore, MemoryStore, StorageError};

/// Patch configuration constants
pub mod consts {
    /// Rows and columns of the patch
    pub const GRID_SIZE: usize = 6;
    /// Highest cell state (0 = empty, 1..=3 = stitch intensity)
    pub const MAX_STATE: u8 = 3;

    /// Namespace prepended to every snapshot date key
    pub const STORAGE_PREFIX: &str = "patch-pattern:";

    /// Days scanned backward when building the history strip
    pub const HISTORY_LOOKBACK_DAYS: u32 = 10;
    /// Thumbnails shown in the history strip
    pub const HISTORY_MAX_ENTRIES: usize = 5;

    /// Cumulative thresholds for randomize (0.45 / 0.25 / 0.20 / 0.10)
    pub const RANDOM_THRESHOLDS: [f64; 3] = [0.45, 0.70, 0.90];
}
