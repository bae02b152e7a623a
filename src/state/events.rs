//! Store mutation events

use serde::Serialize;

/// Events the store queues for the view synchronizer, in mutation order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StoreEvent {
    /// A new entry now sits at `index` in display order
    EntryAdded { name: String, index: usize },

    /// The entry is gone; its row and panel must go too
    EntryRemoved { name: String },

    /// The entry to show in the panel area (`None` = nothing open)
    SelectionChanged { name: Option<String> },

    /// Payload or view state of an entry changed in place (edit, view mode, theme)
    EntryUpdated { name: String },
}

impl StoreEvent {
    /// Name of the entry the event is about, if any
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            StoreEvent::EntryAdded { name, .. }
            | StoreEvent::EntryRemoved { name }
            | StoreEvent::EntryUpdated { name } => Some(name),
            StoreEvent::SelectionChanged { name } => name.as_deref(),
        }
    }

    pub fn added(name: &str, index: usize) -> Self {
        StoreEvent::EntryAdded {
            name: name.to_string(),
            index,
        }
    }

    pub fn removed(name: &str) -> Self {
        StoreEvent::EntryRemoved {
            name: name.to_string(),
        }
    }

    pub fn selected(name: Option<&str>) -> Self {
        StoreEvent::SelectionChanged {
            name: name.map(str::to_string),
        }
    }

    pub fn updated(name: &str) -> Self {
        StoreEvent::EntryUpdated {
            name: name.to_string(),
        }
    }
}
