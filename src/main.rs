//! Daily Patch entry point
//!
//! On the web this wires the patch session to the page's DOM and
//! LocalStorage. Natively it is a small command-line driver over a JSON
//! store file.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element};

    use daily_patch::consts::*;
    use daily_patch::session::EMPTY_HISTORY_LABEL;
    use daily_patch::storage::LocalStore;
    use daily_patch::{
        DateKey, Grid, HistoryEntry, Presenter, Session, Settings, Status, SystemClock,
    };

    type WebSession = Session<LocalStore, SystemClock, DomPresenter>;

    /// Draws the session into the page's patch elements
    struct DomPresenter {
        document: Document,
        grid: Element,
        day: Element,
        status_text: Element,
        patch_state: Element,
        history_strip: Element,
    }

    impl DomPresenter {
        /// Look up the page elements; `None` if any is missing
        fn find(document: &Document) -> Option<Self> {
            Some(Self {
                document: document.clone(),
                grid: document.get_element_by_id("patch-grid")?,
                day: document.get_element_by_id("patch-day")?,
                status_text: document.get_element_by_id("status-text")?,
                patch_state: document.get_element_by_id("patch-state")?,
                history_strip: document.get_element_by_id("history-strip")?,
            })
        }

        /// Create the cell buttons (listeners are attached separately)
        fn build_cells(&self) -> Result<(), JsValue> {
            self.grid.set_inner_html("");
            for r in 0..GRID_SIZE {
                for c in 0..GRID_SIZE {
                    let cell = self.document.create_element("button")?;
                    cell.set_attribute("type", "button")?;
                    cell.set_class_name("cell state-0");
                    cell.set_attribute("data-row", &r.to_string())?;
                    cell.set_attribute("data-col", &c.to_string())?;

                    let inner = self.document.create_element("div")?;
                    inner.set_class_name("cell-inner");
                    cell.append_child(&inner)?;

                    self.grid.append_child(&cell)?;
                }
            }
            Ok(())
        }

        fn cell_element(&self, row: usize, col: usize) -> Option<Element> {
            let selector = format!(".cell[data-row=\"{}\"][data-col=\"{}\"]", row, col);
            self.grid.query_selector(&selector).ok().flatten()
        }

        fn history_tile(&self, entry: &HistoryEntry) -> Result<Element, JsValue> {
            let tile = self.document.create_element("div")?;
            tile.set_class_name("history-tile");
            tile.set_attribute("title", &entry.date.to_string())?;
            for &v in entry.grid.rows().iter().flatten() {
                let hc = self.document.create_element("div")?;
                match v {
                    0 => hc.set_class_name("history-cell"),
                    v => hc.set_class_name(&format!("history-cell s{}", v)),
                }
                tile.append_child(&hc)?;
            }
            Ok(tile)
        }

        fn render_history(&self, entries: &[HistoryEntry]) -> Result<(), JsValue> {
            self.history_strip.set_inner_html("");
            if entries.is_empty() {
                let span = self.document.create_element("span")?;
                span.set_class_name("history-label");
                span.set_text_content(Some(EMPTY_HISTORY_LABEL));
                self.history_strip.append_child(&span)?;
                return Ok(());
            }
            for entry in entries {
                let tile = self.history_tile(entry)?;
                self.history_strip.append_child(&tile)?;
            }
            Ok(())
        }
    }

    impl Presenter for DomPresenter {
        fn day_changed(&mut self, today: DateKey) {
            self.day.set_text_content(Some(&today.label()));
        }

        fn cell_changed(&mut self, row: usize, col: usize, value: u8) {
            if let Some(cell) = self.cell_element(row, col) {
                cell.set_class_name(&format!("cell state-{}", value));
            }
        }

        fn grid_replaced(&mut self, grid: &Grid) {
            for (r, row) in grid.rows().iter().enumerate() {
                for (c, &v) in row.iter().enumerate() {
                    self.cell_changed(r, c, v);
                }
            }
        }

        fn status_changed(&mut self, status: &Status) {
            self.status_text.set_text_content(Some(&status.stitched_label()));
            self.patch_state.set_text_content(Some(status.save_state.label()));
        }

        fn history_ready(&mut self, entries: &[HistoryEntry]) {
            if let Err(e) = self.render_history(entries) {
                log::error!("Failed to render history: {:?}", e);
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);
        log::info!("Daily Patch starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document, nothing to draw into");
            return;
        };
        let Some(presenter) = DomPresenter::find(&document) else {
            log::warn!("Patch elements missing from page, not starting");
            return;
        };
        if let Err(e) = presenter.build_cells() {
            log::error!("Failed to build patch grid: {:?}", e);
            return;
        }
        let store = match LocalStore::open() {
            Ok(store) => store,
            Err(e) => {
                log::error!("Cannot persist patches: {}", e);
                return;
            }
        };

        let settings = Settings::load(&store);
        let seed = js_sys::Date::now() as u64;
        let session = Rc::new(RefCell::new(Session::start(
            store,
            SystemClock,
            settings,
            presenter,
            seed,
        )));

        setup_cell_handlers(&document, session.clone());
        setup_buttons(&document, session.clone());
        setup_lifecycle(&document, session);

        log::info!("Daily Patch running!");
    }

    fn setup_cell_handlers(document: &Document, session: Rc<RefCell<WebSession>>) {
        let Ok(cells) = document.query_selector_all("#patch-grid .cell") else {
            return;
        };
        for i in 0..cells.length() {
            let Some(cell) = cells.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let row = cell.get_attribute("data-row").and_then(|v| v.parse::<usize>().ok());
            let col = cell.get_attribute("data-col").and_then(|v| v.parse::<usize>().ok());
            let (Some(row), Some(col)) = (row, col) else {
                continue;
            };

            let session = session.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                session.borrow_mut().cell_clicked(row, col);
            });
            let _ = cell.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &Document, session: Rc<RefCell<WebSession>>) {
        if let Some(btn) = document.get_element_by_id("btn-random") {
            let session = session.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                session.borrow_mut().randomize();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("btn-clear") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                session.borrow_mut().clear();
                log::info!("Patch cleared");
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_lifecycle(document: &Document, session: Rc<RefCell<WebSession>>) {
        // Visibility change (tab switch, minimize)
        {
            let session = session.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut s = session.borrow_mut();
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    s.became_hidden();
                } else {
                    // Coming back after midnight starts a new patch
                    s.refresh_day();
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Page close / reload
        if let Some(window) = web_sys::window() {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                session.borrow_mut().about_to_unload();
            });
            let _ = window
                .add_event_listener_with_callback("beforeunload", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;

    use anyhow::Context;
    use clap::{Parser, Subcommand};

    use daily_patch::consts::*;
    use daily_patch::grid::state_glyph;
    use daily_patch::session::EMPTY_HISTORY_LABEL;
    use daily_patch::storage::FileStore;
    use daily_patch::{
        Clock, DateKey, FixedClock, Grid, HistoryEntry, KeyValueStore, Presenter, Session,
        Settings, Status, SystemClock,
    };

    /// Daily Patch - stitch one 6x6 patch per day
    #[derive(Parser)]
    #[command(author, version, about, long_about = None)]
    struct Cli {
        #[command(subcommand)]
        command: Option<Command>,

        /// Store file holding every day's patch
        #[arg(short, long, value_name = "FILE", default_value = "patch-store.json")]
        store: PathBuf,

        /// Act as if today were this day
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<DateKey>,

        /// Days scanned backward for history (overrides stored settings)
        #[arg(long)]
        lookback_days: Option<u32>,

        /// Maximum history entries (overrides stored settings)
        #[arg(long)]
        max_entries: Option<usize>,

        /// Store the history overrides as the new defaults
        #[arg(long)]
        save_settings: bool,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Show today's patch and recent history
        Show,

        /// Advance one cell to its next stitch state
        Cycle {
            #[arg(value_parser = clap::value_parser!(u8).range(0..GRID_SIZE as i64))]
            row: u8,
            #[arg(value_parser = clap::value_parser!(u8).range(0..GRID_SIZE as i64))]
            col: u8,
        },

        /// Fill today's patch at random
        Randomize {
            /// RNG seed for a reproducible patch
            #[arg(long)]
            seed: Option<u64>,
        },

        /// Empty today's patch and delete its snapshot
        Clear,

        /// Save today's patch now
        Save,

        /// List recent days only
        History,
    }

    /// Collects session state and prints it as text
    #[derive(Default)]
    struct TextPresenter {
        today: Option<DateKey>,
        grid: Grid,
        status: Option<Status>,
        history: Vec<HistoryEntry>,
    }

    impl Presenter for TextPresenter {
        fn day_changed(&mut self, today: DateKey) {
            self.today = Some(today);
        }

        fn cell_changed(&mut self, row: usize, col: usize, value: u8) {
            self.grid.set(row, col, value);
        }

        fn grid_replaced(&mut self, grid: &Grid) {
            self.grid = *grid;
        }

        fn status_changed(&mut self, status: &Status) {
            self.status = Some(*status);
        }

        fn history_ready(&mut self, entries: &[HistoryEntry]) {
            self.history = entries.to_vec();
        }
    }

    impl TextPresenter {
        fn patch_text(&self) -> String {
            let mut out = String::new();
            if let Some(today) = self.today {
                out.push_str(&format!("{} ({})\n", today.label(), today));
            }
            out.push_str(&self.grid.to_string());
            out.push('\n');
            if let Some(status) = self.status {
                out.push_str(&format!(
                    "{} - {}\n",
                    status.stitched_label(),
                    status.save_state.label()
                ));
            }
            out
        }

        /// Thumbnails side by side, newest on the left
        fn history_text(&self) -> String {
            if self.history.is_empty() {
                return format!("{}\n", EMPTY_HISTORY_LABEL);
            }
            let header: Vec<String> = self
                .history
                .iter()
                .map(|e| format!("{:<width$}", e.date.date().format("%m-%d").to_string(), width = GRID_SIZE))
                .collect();
            let mut out = header.join("  ").trim_end().to_string();
            out.push('\n');
            for r in 0..GRID_SIZE {
                let line: Vec<String> = self
                    .history
                    .iter()
                    .map(|e| e.grid.rows()[r].iter().map(|&v| state_glyph(v)).collect())
                    .collect();
                out.push_str(&line.join("  "));
                out.push('\n');
            }
            out
        }
    }

    /// Stored settings with command-line overrides applied
    fn resolve_settings<S: KeyValueStore>(
        store: &mut S,
        lookback_days: Option<u32>,
        max_entries: Option<usize>,
        persist: bool,
    ) -> Settings {
        let mut settings = Settings::load(&*store);
        if let Some(days) = lookback_days {
            settings.history_lookback_days = days;
        }
        if let Some(max) = max_entries {
            settings.history_max_entries = max;
        }
        if persist {
            settings.save(store);
        }
        settings
    }

    /// Apply one command to a session.
    ///
    /// A CLI run is a whole session, so edits are saved right away; an edit
    /// that empties the patch removes today's snapshot.
    fn apply_command<S: KeyValueStore, C: Clock>(
        session: &mut Session<S, C, TextPresenter>,
        command: &Command,
    ) {
        match *command {
            Command::Show | Command::History => {}
            Command::Cycle { row, col } => {
                session.cell_clicked(usize::from(row), usize::from(col));
                session.save();
            }
            Command::Randomize { .. } => {
                session.randomize();
                session.save();
            }
            Command::Clear => session.clear(),
            Command::Save => {
                if !session.save() {
                    log::warn!("Nothing saved for {}", session.today());
                }
            }
        }
    }

    pub fn run() -> anyhow::Result<()> {
        let cli = Cli::parse();

        let mut store = FileStore::open(&cli.store)
            .with_context(|| format!("opening patch store {}", cli.store.display()))?;

        let settings = resolve_settings(
            &mut store,
            cli.lookback_days,
            cli.max_entries,
            cli.save_settings,
        );

        let fixed = cli.date.map(FixedClock);
        let clock: &dyn Clock = match &fixed {
            Some(clock) => clock,
            None => &SystemClock,
        };

        let command = cli.command.unwrap_or(Command::Show);
        let seed = match &command {
            Command::Randomize { seed: Some(seed) } => *seed,
            _ => rand::random(),
        };

        let mut session = Session::start(store, clock, settings, TextPresenter::default(), seed);
        apply_command(&mut session, &command);

        if let Command::History = command {
            print!("{}", session.presenter().history_text());
            return Ok(());
        }

        session.about_to_unload();

        let presenter = session.presenter();
        print!("{}", presenter.patch_text());
        println!();
        print!("{}", presenter.history_text());
        Ok(())
    }

}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Daily Patch (native) starting...");
    cli::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
