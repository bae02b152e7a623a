// Static action table for the viewer.
// Key handling and the help overlay are both driven from ACTIONS.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// All actions the viewer can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Navigation
    Navigate(NavigateAction),
    NextDataset,
    PrevDataset,

    // Clipboard
    Copy,
    CopyWithHeaders,
    Paste,
    ToggleBlockSelection,

    // Search
    Find,
    FindNext,
    FindPrevious,

    // Data
    ImportFile,
    ImportClipboard,
    Export,
    Refresh,
    ToggleMark,
    DeleteSelected,
    ExportHistory,

    // View
    ToggleStatistics,
    CycleTheme,
    CycleEntryTheme,
    ToggleLog,
    ToggleHelp,
    PrintStore,

    // Application control
    Quit,
}

/// Cursor movement inside the visible panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateAction {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
}

impl NavigateAction {
    /// (rows, columns) to move the cursor by
    pub fn delta(&self, page: usize) -> (isize, isize) {
        let page = page.max(1) as isize;
        match self {
            NavigateAction::Up => (-1, 0),
            NavigateAction::Down => (1, 0),
            NavigateAction::Left => (0, -1),
            NavigateAction::Right => (0, 1),
            NavigateAction::PageUp => (-page, 0),
            NavigateAction::PageDown => (page, 0),
        }
    }
}

/// One row of the action table: menu label, key and the action it triggers
#[derive(Debug, Clone, Copy)]
pub struct ActionSpec {
    pub label: &'static str,
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
    pub action: Action,
}

const fn key(label: &'static str, code: KeyCode, action: Action) -> ActionSpec {
    ActionSpec {
        label,
        code,
        modifiers: KeyModifiers::NONE,
        action,
    }
}

const fn ctrl(label: &'static str, c: char, action: Action) -> ActionSpec {
    ActionSpec {
        label,
        code: KeyCode::Char(c),
        modifiers: KeyModifiers::CONTROL,
        action,
    }
}

pub static ACTIONS: &[ActionSpec] = &[
    key("Up", KeyCode::Up, Action::Navigate(NavigateAction::Up)),
    key("Down", KeyCode::Down, Action::Navigate(NavigateAction::Down)),
    key("Left", KeyCode::Left, Action::Navigate(NavigateAction::Left)),
    key("Right", KeyCode::Right, Action::Navigate(NavigateAction::Right)),
    key("Page up", KeyCode::PageUp, Action::Navigate(NavigateAction::PageUp)),
    key("Page down", KeyCode::PageDown, Action::Navigate(NavigateAction::PageDown)),
    key("Next dataset", KeyCode::Tab, Action::NextDataset),
    key("Previous dataset", KeyCode::BackTab, Action::PrevDataset),
    key("Copy", KeyCode::Char('y'), Action::Copy),
    key("Copy with headers", KeyCode::Char('Y'), Action::CopyWithHeaders),
    key("Paste", KeyCode::Char('p'), Action::Paste),
    key("Block selection", KeyCode::Char('v'), Action::ToggleBlockSelection),
    ctrl("Find", 'f', Action::Find),
    key("Find next", KeyCode::Char('n'), Action::FindNext),
    key("Find previous", KeyCode::Char('N'), Action::FindPrevious),
    key("Import file", KeyCode::Char('o'), Action::ImportFile),
    key("Import from clipboard", KeyCode::Char('i'), Action::ImportClipboard),
    key("Export", KeyCode::Char('e'), Action::Export),
    key("Refresh", KeyCode::Char('r'), Action::Refresh),
    key("Mark dataset", KeyCode::Char(' '), Action::ToggleMark),
    key("Delete selected", KeyCode::Char('d'), Action::DeleteSelected),
    key("Export history", KeyCode::Char('H'), Action::ExportHistory),
    key("Toggle statistics", KeyCode::Char('s'), Action::ToggleStatistics),
    key("Cycle theme", KeyCode::Char('t'), Action::CycleTheme),
    key("Cycle dataset theme", KeyCode::Char('T'), Action::CycleEntryTheme),
    key("Show log", KeyCode::Char('l'), Action::ToggleLog),
    key("Help", KeyCode::F(1), Action::ToggleHelp),
    ctrl("Print store", 'p', Action::PrintStore),
    key("Quit", KeyCode::Char('q'), Action::Quit),
    ctrl("Quit", 'c', Action::Quit),
];

/// Look up the action bound to a key press
pub fn action_for_key(event: &KeyEvent) -> Option<Action> {
    // Shifted letters arrive as uppercase chars; the SHIFT flag is not part of the binding
    let modifiers = event.modifiers.difference(KeyModifiers::SHIFT);
    ACTIONS
        .iter()
        .find(|spec| spec.code == event.code && spec.modifiers == modifiers)
        .map(|spec| spec.action)
}

/// Human-readable key for the help overlay
pub fn key_label(spec: &ActionSpec) -> String {
    let key = match spec.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::F(n) => format!("F{}", n),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
        other => format!("{:?}", other),
    };
    if spec.modifiers.contains(KeyModifiers::CONTROL) {
        format!("Ctrl+{}", key)
    } else {
        key
    }
}

/// (key, label) pairs for the help overlay, one per action
pub fn help_entries() -> Vec<(String, &'static str)> {
    let mut seen = Vec::new();
    ACTIONS
        .iter()
        .filter(|spec| {
            let first = !seen.contains(&spec.action);
            seen.push(spec.action);
            first
        })
        .map(|spec| (key_label(spec), spec.label))
        .collect()
}
