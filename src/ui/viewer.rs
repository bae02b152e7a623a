use crate::config::{Settings, Theme};
use crate::data::cell_search::{CellSearch, SearchDirection};
use crate::data::clipboard::{SystemClipboard, TextClipboard};
use crate::data::data_exporter::DataExporter;
use crate::data::datatable::{DataTable, SharedTable};
use crate::data::loaders::{dataset_name_for_path, load_delimited_text, load_file};
use crate::error::ViewerError;
use crate::state::panel::Panel;
use crate::state::synchronizer::ViewSynchronizer;
use crate::store::{AppStore, CallerScope};
use crate::ui::actions::{action_for_key, Action};
use crate::ui::render;
use crate::ui::table_panel::TablePanelFactory;
use anyhow::{anyhow, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What a line prompt is collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    ImportPath,
    ExportPath,
    Find,
}

impl PromptKind {
    pub fn title(&self) -> &'static str {
        match self {
            PromptKind::ImportPath => "Import file",
            PromptKind::ExportPath => "Export to",
            PromptKind::Find => "Find",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Prompt { kind: PromptKind, input: String },
}

/// A file import finished on a worker thread
struct ImportOutcome {
    path: PathBuf,
    name: String,
    /// Entry to refresh instead of adding a new one
    refresh: bool,
    table: crate::error::Result<DataTable>,
}

/// One viewer window: owns its store, the synchronizer that mirrors it on
/// screen, and the clipboard. Every store mutation made here is followed
/// by a sync so the navigator and panels never lag behind.
pub struct Viewer {
    store: AppStore,
    /// Host bindings seen by `open`, used again by Refresh
    scope: CallerScope,
    last_search: Option<CellSearch>,
    sync: ViewSynchronizer<TablePanelFactory>,
    clipboard: Box<dyn TextClipboard>,
    mode: InputMode,
    status: String,
    show_log: bool,
    show_help: bool,
    page_size: usize,
    should_quit: bool,
    import_tx: Sender<ImportOutcome>,
    import_rx: Receiver<ImportOutcome>,
    pending_imports: usize,
}

impl Viewer {
    pub fn new(settings: Settings, clipboard: Box<dyn TextClipboard>) -> Self {
        let (import_tx, import_rx) = mpsc::channel();
        Self {
            store: AppStore::new(settings),
            scope: CallerScope::new(),
            last_search: None,
            sync: ViewSynchronizer::new(TablePanelFactory::new()),
            clipboard,
            mode: InputMode::Normal,
            status: "Ready - press F1 for help".to_string(),
            show_log: false,
            show_help: false,
            page_size: 20,
            should_quit: false,
            import_tx,
            import_rx,
            pending_imports: 0,
        }
    }

    pub fn with_system_clipboard(settings: Settings) -> Self {
        Self::new(settings, Box::new(SystemClipboard::new()))
    }

    /// Open datasets, resolving unnamed ones against `scope`
    pub fn open(
        &mut self,
        objects: Vec<(Option<String>, SharedTable)>,
        scope: &CallerScope,
    ) -> Vec<String> {
        self.remember_scope(scope);
        let names = self.store.add_many(objects, scope);
        self.sync_view();
        if !names.is_empty() {
            self.status = format!("Opened {}", names.join(", "));
        }
        names
    }

    /// Refresh every open dataset that `scope` binds by name
    pub fn refresh_from_scope(&mut self, scope: &CallerScope) -> Vec<String> {
        self.remember_scope(scope);
        let names = self.store.refresh_from_scope(scope);
        self.sync_view();
        self.status = if names.is_empty() {
            "No matching datasets found to refresh".to_string()
        } else {
            format!("Refreshed {}", names.join(", "))
        };
        names
    }

    /// Rebind `name` in the remembered scope, as when the host reassigns a
    /// variable. The open dataset picks it up on the next Refresh.
    pub fn bind(&mut self, name: impl Into<String>, table: &SharedTable) {
        self.scope.insert(name, table);
    }

    fn remember_scope(&mut self, scope: &CallerScope) {
        for (name, table) in scope.iter() {
            self.scope.insert(name, table);
        }
    }

    /// Mutate the store directly, then bring the view up to date
    pub fn update<R>(&mut self, f: impl FnOnce(&mut AppStore) -> R) -> R {
        let result = f(&mut self.store);
        self.sync_view();
        result
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn synchronizer(&self) -> &ViewSynchronizer<TablePanelFactory> {
        &self.sync
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn mode(&self) -> &InputMode {
        &self.mode
    }

    pub fn show_log(&self) -> bool {
        self.show_log
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn pending_imports(&self) -> usize {
        self.pending_imports
    }

    pub fn set_page_size(&mut self, rows: usize) {
        self.page_size = rows.max(1);
    }

    fn sync_view(&mut self) {
        if let Err(e) = self.sync.sync(&mut self.store) {
            error!("View sync failed, rebuilding from store: {}", e);
            self.sync.reconcile(&mut self.store);
        }
    }

    // --- Actions ---

    /// Run an action; failures are logged and shown, never propagated
    pub fn perform(&mut self, action: Action) {
        debug!("Performing {:?}", action);
        if let Err(e) = self.handle_action(action) {
            error!("{:?} failed: {:#}", action, e);
            self.status = match e.downcast_ref::<ViewerError>() {
                Some(viewer_error) => format!("Error: {}", viewer_error.user_message()),
                None => format!("Error: {:#}", e),
            };
        }
        self.sync_view();
    }

    pub fn handle_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Navigate(nav) => {
                if let Some(panel) = self.sync.visible_panel_mut() {
                    let (rows, columns) = nav.delta(self.page_size);
                    panel.move_cursor(rows, columns);
                }
            }
            Action::NextDataset | Action::PrevDataset => {
                let navigator = self.sync.navigator();
                let target = match action {
                    Action::NextDataset => navigator.next_name(),
                    _ => navigator.prev_name(),
                }
                .map(str::to_string);
                if let Some(name) = target {
                    self.store.select(&name)?;
                }
            }
            Action::Copy | Action::CopyWithHeaders => {
                let with_headers = action == Action::CopyWithHeaders;
                let panel = self.sync.visible_panel().context("No dataset is open")?;
                let cells = panel.copy_selection(self.clipboard.as_mut(), with_headers)?;
                self.status = format!("Copied {} cells", cells);
            }
            Action::Paste => {
                let panel = self.sync.visible_panel().context("No dataset is open")?;
                let edits = panel.paste(self.clipboard.as_mut())?;
                let name = panel.name().to_string();
                let count = self.store.apply_cell_edits(&name, &edits)?;
                self.status = format!("Pasted {} cells into {}", count, name);
            }
            Action::ToggleBlockSelection => {
                if let Some(panel) = self.sync.visible_panel_mut() {
                    panel.toggle_block_selection();
                }
            }
            Action::Find => {
                self.sync.visible_panel().context("No dataset is open")?;
                self.mode = InputMode::Prompt {
                    kind: PromptKind::Find,
                    input: self
                        .last_search
                        .as_ref()
                        .map(|search| search.pattern().to_string())
                        .unwrap_or_default(),
                };
            }
            Action::FindNext => self.find_in_panel(SearchDirection::Forward)?,
            Action::FindPrevious => self.find_in_panel(SearchDirection::Backward)?,
            Action::ImportFile => {
                self.mode = InputMode::Prompt {
                    kind: PromptKind::ImportPath,
                    input: String::new(),
                };
            }
            Action::ImportClipboard => {
                let text = self.clipboard.get_text()?;
                let table = load_delimited_text(&text, "clipboard")?;
                let name = self
                    .store
                    .add(Arc::new(table), None, &CallerScope::new());
                self.status = format!("Imported clipboard as {}", name);
            }
            Action::Export => {
                let entry = self.store.selected_entry().context("No dataset is open")?;
                self.mode = InputMode::Prompt {
                    kind: PromptKind::ExportPath,
                    input: format!("{}.csv", entry.name()),
                };
            }
            Action::Refresh => self.refresh_all()?,
            Action::ToggleMark => {
                let current = self.sync.navigator().current().map(|row| row.name.clone());
                if let Some(name) = current {
                    self.sync.navigator_mut().toggle_mark(&name);
                }
            }
            Action::DeleteSelected => {
                let names = self.sync.navigator().marked_or_current();
                if names.is_empty() {
                    return Err(anyhow!("No dataset is open"));
                }
                let refs: Vec<&str> = names.iter().map(String::as_str).collect();
                self.store.remove_many(&refs)?;
                self.sync.navigator_mut().clear_marks();
                self.status = format!("Removed {}", names.join(", "));
            }
            Action::ExportHistory => {
                let entry = self.store.selected_entry().context("No dataset is open")?;
                let script = entry.history_export();
                let count = entry.history().len();
                self.clipboard.set_text(&script)?;
                self.status = format!("Copied {} history items to the clipboard", count);
            }
            Action::ToggleStatistics => {
                let entry = self.store.selected_entry().context("No dataset is open")?;
                let (name, mode) = (entry.name().to_string(), entry.view_mode().toggled());
                self.store.set_view_mode(&name, mode)?;
                self.status = format!("{}: {} view", name, mode.label());
            }
            Action::CycleTheme => {
                let theme = self.store.settings().theme.next();
                self.store.set_theme(theme);
                self.status = format!("Theme: {}", theme);
            }
            Action::CycleEntryTheme => {
                let entry = self.store.selected_entry().context("No dataset is open")?;
                let name = entry.name().to_string();
                let next = match entry.settings().theme {
                    None => Some(Theme::Light),
                    Some(Theme::Classic) => None,
                    Some(theme) => Some(theme.next()),
                };
                self.store.set_entry_theme(&name, next)?;
                self.status = match next {
                    Some(theme) => format!("{} theme: {}", name, theme),
                    None => format!("{} follows the global theme", name),
                };
            }
            Action::ToggleLog => self.show_log = !self.show_log,
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::PrintStore => {
                let dump = serde_json::to_string_pretty(&self.store.snapshot())
                    .context("Failed to serialize store")?;
                info!("Store snapshot:\n{}", dump);
                self.status = "Store snapshot written to the log".to_string();
            }
            Action::Quit => self.should_quit = true,
        }
        Ok(())
    }

    /// Re-read every open dataset: scope bindings first, then the source
    /// file of entries the scope does not bind
    fn refresh_all(&mut self) -> Result<()> {
        if self.store.is_empty() {
            return Err(anyhow!("No dataset is open"));
        }

        let scope = self.scope.clone();
        let refreshed = self.store.refresh_from_scope(&scope);
        let reloads: Vec<(PathBuf, String)> = self
            .store
            .entries()
            .iter()
            .filter(|entry| !refreshed.iter().any(|name| name == entry.name()))
            .filter_map(|entry| Some((entry.source_path()?, entry.name().to_string())))
            .collect();

        if refreshed.is_empty() && reloads.is_empty() {
            return Err(anyhow!("No matching datasets found to refresh"));
        }

        let reloaded: Vec<String> = reloads.iter().map(|(_, name)| name.clone()).collect();
        for (path, name) in reloads {
            self.start_import(path, name, true);
        }
        self.status = match (refreshed.is_empty(), reloaded.is_empty()) {
            (false, true) => format!("Refreshed {}", refreshed.join(", ")),
            (true, false) => format!("Reloading {}...", reloaded.join(", ")),
            _ => format!(
                "Refreshed {}; reloading {}...",
                refreshed.join(", "),
                reloaded.join(", ")
            ),
        };
        Ok(())
    }

    fn find_in_panel(&mut self, direction: SearchDirection) -> Result<()> {
        let search = self
            .last_search
            .as_ref()
            .context("Nothing to find yet - press Ctrl+f")?;
        let panel = self.sync.visible_panel_mut().context("No dataset is open")?;
        let (row, col) = panel
            .find(search, direction)
            .ok_or_else(|| anyhow!("No cell matches '{}'", search.pattern()))?;
        self.status = format!(
            "Found '{}' at row {}, column {}",
            search.pattern(),
            row + 1,
            col + 1
        );
        Ok(())
    }

    fn export_selected(&mut self, path: PathBuf) -> Result<()> {
        let entry = self.store.selected_entry().context("No dataset is open")?;
        DataExporter::export_file(entry.data(), &path)
            .with_context(|| format!("Failed to export '{}'", entry.name()))?;
        info!("Exported '{}' to {}", entry.name(), path.display());
        self.status = format!("Exported {} to {}", entry.name(), path.display());
        Ok(())
    }

    // --- Background imports ---

    /// Load `path` on a worker thread. The result is applied to the store by
    /// [`Viewer::poll_imports`] on the control thread.
    pub fn import_file(&mut self, path: PathBuf) {
        let name = dataset_name_for_path(&path);
        self.start_import(path, name, false);
    }

    fn start_import(&mut self, path: PathBuf, name: String, refresh: bool) {
        info!("Importing {} as '{}'", path.display(), name);
        self.status = format!("Loading {}...", path.display());
        self.pending_imports += 1;

        let tx = self.import_tx.clone();
        thread::spawn(move || {
            let table = load_file(&path);
            let outcome = ImportOutcome {
                path,
                name,
                refresh,
                table,
            };
            // The viewer may already be gone
            let _ = tx.send(outcome);
        });
    }

    /// Apply finished imports; returns how many were applied
    pub fn poll_imports(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.import_rx.try_recv() {
            self.apply_import(outcome);
            applied += 1;
        }
        if applied > 0 {
            self.sync_view();
        }
        applied
    }

    /// Block until every pending import has been applied or `timeout` passes
    pub fn wait_for_imports(&mut self, timeout: Duration) -> usize {
        let mut applied = 0;
        while self.pending_imports > 0 {
            match self.import_rx.recv_timeout(timeout) {
                Ok(outcome) => {
                    self.apply_import(outcome);
                    applied += 1;
                }
                Err(_) => {
                    warn!("Timed out waiting for {} imports", self.pending_imports);
                    break;
                }
            }
        }
        self.sync_view();
        applied
    }

    fn apply_import(&mut self, outcome: ImportOutcome) {
        self.pending_imports = self.pending_imports.saturating_sub(1);
        let table = match outcome.table {
            Ok(table) => Arc::new(table),
            Err(e) => {
                error!("Import of {} failed: {}", outcome.path.display(), e);
                self.status = format!("Error: {}", e.user_message());
                return;
            }
        };

        if outcome.refresh && self.store.contains(&outcome.name) {
            match self.store.refresh(&outcome.name, table) {
                Ok(()) => self.status = format!("Refreshed {}", outcome.name),
                Err(e) => self.status = format!("Error: {}", e.user_message()),
            }
        } else {
            let name = self
                .store
                .add(table, Some(&outcome.name), &CallerScope::new());
            self.status = format!("Loaded {}", name);
        }
    }

    // --- Input ---

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if let InputMode::Prompt { kind, input } = &mut self.mode {
            match key.code {
                KeyCode::Esc => self.mode = InputMode::Normal,
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                KeyCode::Enter => {
                    let (kind, input) = (*kind, input.trim().to_string());
                    self.mode = InputMode::Normal;
                    self.submit_prompt(kind, input);
                }
                _ => {}
            }
            return;
        }

        if key.code == KeyCode::Esc && (self.show_help || self.show_log) {
            self.show_help = false;
            self.show_log = false;
            return;
        }

        if let Some(action) = action_for_key(&key) {
            self.perform(action);
        }
    }

    fn submit_prompt(&mut self, kind: PromptKind, input: String) {
        if input.is_empty() {
            self.status = "Cancelled".to_string();
            return;
        }
        match kind {
            PromptKind::ImportPath => self.import_file(PathBuf::from(input)),
            PromptKind::ExportPath => {
                if let Err(e) = self.export_selected(PathBuf::from(input)) {
                    error!("Export failed: {:#}", e);
                    self.status = format!("Error: {:#}", e);
                }
            }
            PromptKind::Find => match CellSearch::new(&input) {
                Ok(search) => {
                    self.last_search = Some(search);
                    self.perform(Action::FindNext);
                }
                Err(e) => {
                    warn!("Invalid search '{}': {}", input, e);
                    self.status = format!("Error: {}", e);
                }
            },
        }
    }

    // --- Terminal ---

    /// Run the UI on an already prepared terminal until the user quits
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        self.should_quit = false;
        while !self.should_quit {
            let height = terminal.size()?.height as usize;
            self.set_page_size(height.saturating_sub(6));
            terminal.draw(|f| render::draw(f, self))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
            self.poll_imports();
        }
        Ok(())
    }

    /// Take over the terminal, run until the user quits, then restore it
    pub fn run_terminal(&mut self) -> Result<()> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run(&mut terminal);

        // Restore the terminal even when the loop failed
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }
}
