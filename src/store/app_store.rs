use crate::config::{Settings, Theme};
use crate::data::datatable::{CellEdit, SharedTable};
use crate::error::{Result, ViewerError};
use crate::state::events::StoreEvent;
use crate::store::entry::{DatasetEntry, HistoryItem, ViewMode};
use crate::store::resolver::{self, CallerScope, NameOrigin, ResolvedDataset};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info};

/// Result of [`AppStore::get`]: a single payload when exactly one dataset
/// matched, otherwise every match in display order.
#[derive(Debug, Clone)]
pub enum Lookup {
    One(SharedTable),
    Many(Vec<(String, SharedTable)>),
}

impl Lookup {
    pub fn len(&self) -> usize {
        match self {
            Lookup::One(_) => 1,
            Lookup::Many(tables) => tables.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_single(self) -> Option<SharedTable> {
        match self {
            Lookup::One(table) => Some(table),
            Lookup::Many(_) => None,
        }
    }

    pub fn into_many(self) -> Vec<(String, SharedTable)> {
        match self {
            Lookup::Many(tables) => tables,
            Lookup::One(table) => vec![(table.name.clone(), table)],
        }
    }
}

/// Serializable dump of the store for the debug view
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshot {
    pub selected: Option<String>,
    pub settings: Settings,
    pub entries: Vec<EntrySnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntrySnapshot {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub view_mode: ViewMode,
    pub theme: Option<Theme>,
    pub history: Vec<HistoryItem>,
}

/// The single authoritative registry of open datasets.
///
/// Entries keep insertion order (the navigator order) and are indexed by
/// name. Every mutation validates its inputs before touching anything and
/// queues [`StoreEvent`]s in the order the changes happened.
#[derive(Debug, Default)]
pub struct AppStore {
    entries: Vec<DatasetEntry>,
    index: HashMap<String, usize>,
    selected: Option<String>,
    settings: Settings,
    outbox: VecDeque<StoreEvent>,
}

impl AppStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    // --- Registry mutations ---

    /// Add one dataset, resolving its name through `scope` when none is given.
    ///
    /// An existing entry with the same name is replaced in place, exactly as
    /// [`AppStore::refresh`] would. The new entry becomes selected only when
    /// the store was empty.
    pub fn add(&mut self, data: SharedTable, name: Option<&str>, scope: &CallerScope) -> String {
        let mut names = self.add_many(vec![(name.map(str::to_string), data)], scope);
        // A single payload always resolves to exactly one name
        names.pop().unwrap_or_default()
    }

    /// Add a batch of datasets, resolved together so untitled numbering and
    /// collision handling apply across the whole batch.
    pub fn add_many(
        &mut self,
        objects: Vec<(Option<String>, SharedTable)>,
        scope: &CallerScope,
    ) -> Vec<String> {
        let resolved = resolver::resolve(objects, scope);
        let resolved = self.renumber_synthesized(resolved);

        resolved
            .into_iter()
            .map(|dataset| {
                self.insert_or_replace(&dataset.name, dataset.data);
                dataset.name
            })
            .collect()
    }

    /// Remove an entry. If it was selected, the selection moves to the entry
    /// immediately before it; a removed first entry leaves nothing selected.
    pub fn remove(&mut self, name: &str) -> Result<DatasetEntry> {
        let position = self.require(name)?;

        let entry = self.entries.remove(position);
        self.index.remove(name);
        self.reindex_from(position);
        info!("Removed dataset '{}'", name);
        self.emit(StoreEvent::removed(name));

        if self.selected.as_deref() == Some(name) {
            let successor = position
                .checked_sub(1)
                .map(|idx| self.entries[idx].name().to_string());
            self.set_selected(successor);
        }

        Ok(entry)
    }

    /// Remove several entries; nothing is removed unless every name exists.
    pub fn remove_many(&mut self, names: &[&str]) -> Result<Vec<DatasetEntry>> {
        let missing = self.missing(names.iter().copied());
        if !missing.is_empty() {
            return Err(ViewerError::NotFound { names: missing });
        }

        let mut unique = HashSet::new();
        let mut removed = Vec::with_capacity(names.len());
        for name in names.iter().copied().filter(|name| unique.insert(*name)) {
            removed.push(self.remove(name)?);
        }
        Ok(removed)
    }

    /// Make `name` the selected entry. Selecting the current entry is a no-op.
    pub fn select(&mut self, name: &str) -> Result<()> {
        self.require(name)?;
        if self.selected.as_deref() != Some(name) {
            debug!("Selecting dataset '{}'", name);
            self.set_selected(Some(name.to_string()));
        }
        Ok(())
    }

    /// Replace an entry's payload in place: same name, same position, same
    /// selection, empty history.
    pub fn refresh(&mut self, name: &str, data: SharedTable) -> Result<()> {
        self.require(name)?;
        self.insert_or_replace(name, data);
        Ok(())
    }

    /// Refresh every open entry that has a binding of the same name in `scope`.
    pub fn refresh_from_scope(&mut self, scope: &CallerScope) -> Vec<String> {
        let matches: Vec<(String, SharedTable)> = scope
            .iter()
            .filter(|(name, _)| self.index.contains_key(*name))
            .map(|(name, table)| (name.to_string(), table.clone()))
            .collect();

        if matches.is_empty() {
            info!("No matching datasets found to refresh");
        }

        matches
            .into_iter()
            .map(|(name, table)| {
                self.insert_or_replace(&name, table);
                name
            })
            .collect()
    }

    // --- Entry state ---

    /// Append a mutation description to an entry's history
    pub fn record_edit(&mut self, name: &str, action: impl Into<String>) -> Result<()> {
        let position = self.require(name)?;
        self.entries[position].record(action);
        Ok(())
    }

    /// Apply cell edits to an entry's payload and record them as one history item.
    ///
    /// Every edit is bounds-checked first; an out-of-range edit rejects the batch.
    pub fn apply_cell_edits(&mut self, name: &str, edits: &[CellEdit]) -> Result<usize> {
        let position = self.require(name)?;
        if edits.is_empty() {
            return Ok(0);
        }

        let (rows, columns) = self.entries[position].data().shape();
        if let Some(bad) = edits.iter().find(|e| e.row >= rows || e.column >= columns) {
            return Err(ViewerError::format(
                name,
                format!(
                    "cell ({}, {}) is outside the {}x{} table",
                    bad.row, bad.column, rows, columns
                ),
            ));
        }

        let entry = &mut self.entries[position];
        let table = entry.data_mut();
        let mut previous = None;
        for edit in edits {
            previous = table.apply_edit(edit).ok();
        }
        table.infer_column_types();

        let action = match (edits, previous) {
            ([edit], Some(old)) => format!(
                "edit cell ({}, {}): '{}' -> '{}'",
                edit.row, edit.column, old, edit.value
            ),
            _ => format!(
                "paste {} cells at ({}, {})",
                edits.len(),
                edits[0].row,
                edits[0].column
            ),
        };
        info!("Dataset '{}': {}", name, action);
        entry.record(action);
        self.emit(StoreEvent::updated(name));
        Ok(edits.len())
    }

    pub fn set_view_mode(&mut self, name: &str, mode: ViewMode) -> Result<()> {
        let position = self.require(name)?;
        if self.entries[position].view_mode() != mode {
            self.entries[position].set_view_mode(mode);
            self.emit(StoreEvent::updated(name));
        }
        Ok(())
    }

    /// Override (or with `None`, inherit) the theme for one entry
    pub fn set_entry_theme(&mut self, name: &str, theme: Option<Theme>) -> Result<()> {
        let position = self.require(name)?;
        self.entries[position].set_theme(theme);
        self.emit(StoreEvent::updated(name));
        Ok(())
    }

    // --- Settings ---

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_theme(&mut self, theme: Theme) {
        info!("Theme set to {}", theme);
        self.settings.theme = theme;
    }

    pub fn apply_setting(&mut self, key: &str, value: &str) -> Result<()> {
        self.settings.set(key, value)
    }

    /// Effective theme for an entry: its own override or the global theme
    pub fn theme_for(&self, name: &str) -> Theme {
        self.entry(name)
            .map(|e| e.settings().effective_theme(self.settings.theme))
            .unwrap_or(self.settings.theme)
    }

    // --- Queries ---

    /// Look up payloads by name; `None` means every open dataset.
    ///
    /// Fails with `NotFound` naming every missing dataset.
    pub fn get(&self, names: Option<&[&str]>) -> Result<Lookup> {
        let mut found: Vec<(String, SharedTable)> = match names {
            None => self
                .entries
                .iter()
                .map(|e| (e.name().to_string(), e.data().clone()))
                .collect(),
            Some(names) => {
                let missing = self.missing(names.iter().copied());
                if !missing.is_empty() {
                    return Err(ViewerError::NotFound { names: missing });
                }
                names
                    .iter()
                    .filter_map(|name| self.entry(name))
                    .map(|e| (e.name().to_string(), e.data().clone()))
                    .collect()
            }
        };

        if found.len() == 1 {
            if let Some((_, table)) = found.pop() {
                return Ok(Lookup::One(table));
            }
        }
        Ok(Lookup::Many(found))
    }

    pub fn entry(&self, name: &str) -> Option<&DatasetEntry> {
        self.index.get(name).map(|&idx| &self.entries[idx])
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name().to_string()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_entry(&self) -> Option<&DatasetEntry> {
        self.selected.as_deref().and_then(|name| self.entry(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            selected: self.selected.clone(),
            settings: self.settings.clone(),
            entries: self
                .entries
                .iter()
                .map(|e| {
                    let (rows, columns) = e.data().shape();
                    EntrySnapshot {
                        name: e.name().to_string(),
                        rows,
                        columns,
                        view_mode: e.view_mode(),
                        theme: e.settings().theme,
                        history: e.history().to_vec(),
                    }
                })
                .collect(),
        }
    }

    // --- Events ---

    /// Take every queued event, oldest first
    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        self.outbox.drain(..).collect()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.outbox.is_empty()
    }

    // --- Internals ---

    fn require(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| ViewerError::not_found(name))
    }

    fn missing<'a>(&self, names: impl Iterator<Item = &'a str>) -> Vec<String> {
        names
            .filter(|name| !self.index.contains_key(*name))
            .map(str::to_string)
            .collect()
    }

    fn emit(&mut self, event: StoreEvent) {
        debug!("Store event: {:?}", event);
        self.outbox.push_back(event);
    }

    fn set_selected(&mut self, name: Option<String>) {
        self.selected = name;
        let event = StoreEvent::selected(self.selected.as_deref());
        self.emit(event);
    }

    fn reindex_from(&mut self, start: usize) {
        for (idx, entry) in self.entries.iter().enumerate().skip(start) {
            self.index.insert(entry.name().to_string(), idx);
        }
    }

    /// Synthesized names never displace an open dataset: move them to the
    /// smallest `untitled_N` free both in the store and in the batch.
    fn renumber_synthesized(&self, resolved: Vec<ResolvedDataset>) -> Vec<ResolvedDataset> {
        let mut taken: HashSet<String> = resolved
            .iter()
            .filter(|r| r.origin != NameOrigin::Synthesized)
            .map(|r| r.name.clone())
            .collect();
        let mut next = 1;

        resolved
            .into_iter()
            .map(|mut dataset| {
                if dataset.origin == NameOrigin::Synthesized {
                    loop {
                        let candidate = format!("untitled_{}", next);
                        next += 1;
                        if !taken.contains(&candidate) && !self.contains(&candidate) {
                            dataset.name = candidate;
                            break;
                        }
                    }
                    taken.insert(dataset.name.clone());
                }
                dataset
            })
            .collect()
    }

    /// Append a new entry, or replace the existing one of the same name in place.
    fn insert_or_replace(&mut self, name: &str, data: SharedTable) {
        if let Some(position) = self.position(name) {
            self.entries[position].replace_data(data);
            info!("Replaced dataset '{}' at position {}", name, position);
            self.emit(StoreEvent::removed(name));
            self.emit(StoreEvent::added(name, position));
            if self.selected.as_deref() == Some(name) {
                self.emit(StoreEvent::selected(Some(name)));
            }
            return;
        }

        let was_empty = self.entries.is_empty();
        let position = self.entries.len();
        self.entries
            .push(DatasetEntry::new(name.to_string(), data));
        self.index.insert(name.to_string(), position);
        info!("Added dataset '{}' at position {}", name, position);
        self.emit(StoreEvent::added(name, position));

        if was_empty {
            self.set_selected(Some(name.to_string()));
        }
    }
}
