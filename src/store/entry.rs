use crate::config::Theme;
use crate::data::datatable::SharedTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Which presentation of the dataset the panel shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Data,
    Statistics,
}

impl ViewMode {
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Data => "Data",
            ViewMode::Statistics => "Statistics",
        }
    }

    pub fn toggled(self) -> ViewMode {
        match self {
            ViewMode::Data => ViewMode::Statistics,
            ViewMode::Statistics => ViewMode::Data,
        }
    }
}

/// Settings one dataset can override independently of the global ones
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntrySettings {
    pub theme: Option<Theme>,
}

impl EntrySettings {
    pub fn effective_theme(&self, global: Theme) -> Theme {
        self.theme.unwrap_or(global)
    }
}

/// One recorded mutation of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub timestamp: DateTime<Utc>,
    pub action: String,
}

/// A dataset tracked by the store together with its view state.
///
/// Only the store mutates entries; everything else sees them through `&`.
#[derive(Debug, Clone)]
pub struct DatasetEntry {
    name: String,
    data: SharedTable,
    history: Vec<HistoryItem>,
    settings: EntrySettings,
    view_mode: ViewMode,
}

impl DatasetEntry {
    pub(crate) fn new(name: String, data: SharedTable) -> Self {
        Self {
            name,
            data,
            history: Vec::new(),
            settings: EntrySettings::default(),
            view_mode: ViewMode::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &SharedTable {
        &self.data
    }

    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    pub fn settings(&self) -> &EntrySettings {
        &self.settings
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// File the payload was imported from, if any
    pub fn source_path(&self) -> Option<PathBuf> {
        self.data.metadata.get("source_path").map(PathBuf::from)
    }

    /// Whether `table` is this entry's payload (same object, not equal contents)
    pub fn holds(&self, table: &SharedTable) -> bool {
        Arc::ptr_eq(&self.data, table)
    }

    /// History as a plain-text script, oldest first
    pub fn history_export(&self) -> String {
        let mut output = format!("# History for {}\n", self.name);
        if self.history.is_empty() {
            output.push_str("# No actions recorded yet\n");
        }
        for item in &self.history {
            output.push_str(&format!(
                "{}  {}\n",
                item.timestamp.format("%Y-%m-%d %H:%M:%S"),
                item.action
            ));
        }
        output
    }

    pub(crate) fn record(&mut self, action: impl Into<String>) {
        self.history.push(HistoryItem {
            timestamp: Utc::now(),
            action: action.into(),
        });
    }

    /// Swap the payload in place; the history describes the old payload, so it goes too.
    pub(crate) fn replace_data(&mut self, data: SharedTable) {
        self.data = data;
        self.history.clear();
    }

    /// Copy-on-write access to the payload for edits.
    pub(crate) fn data_mut(&mut self) -> &mut crate::data::datatable::DataTable {
        Arc::make_mut(&mut self.data)
    }

    pub(crate) fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub(crate) fn set_theme(&mut self, theme: Option<Theme>) {
        self.settings.theme = theme;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::DataTable;

    #[test]
    fn test_replace_data_clears_history() {
        let mut entry = DatasetEntry::new("sales".to_string(), Arc::new(DataTable::new("a")));
        entry.record("edit cell (0, 0)");
        assert_eq!(entry.history().len(), 1);

        let replacement = Arc::new(DataTable::new("b"));
        entry.replace_data(replacement.clone());

        assert!(entry.history().is_empty());
        assert!(entry.holds(&replacement));
        assert_eq!(entry.name(), "sales");
    }

    #[test]
    fn test_holds_uses_identity() {
        let table = Arc::new(DataTable::new("a"));
        let entry = DatasetEntry::new("a".to_string(), table.clone());
        let equal_copy = Arc::new(DataTable::new("a"));
        assert!(entry.holds(&table));
        assert!(!entry.holds(&equal_copy));
    }

    #[test]
    fn test_entry_theme_overrides_global() {
        let mut settings = EntrySettings::default();
        assert_eq!(settings.effective_theme(Theme::Dark), Theme::Dark);
        settings.theme = Some(Theme::Classic);
        assert_eq!(settings.effective_theme(Theme::Dark), Theme::Classic);
    }

    #[test]
    fn test_history_export_lists_actions() {
        let mut entry = DatasetEntry::new("t".to_string(), Arc::new(DataTable::new("t")));
        assert!(entry.history_export().contains("No actions recorded yet"));
        entry.record("paste 4 cells at (1, 2)");
        assert!(entry.history_export().contains("paste 4 cells at (1, 2)"));
    }
}
