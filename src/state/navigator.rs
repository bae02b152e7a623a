//! Navigator rows: the on-screen list of open dataset names

use std::collections::HashSet;

/// One row of the navigator list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorRow {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
}

impl NavigatorRow {
    pub fn new(name: impl Into<String>, shape: (usize, usize)) -> Self {
        Self {
            name: name.into(),
            rows: shape.0,
            columns: shape.1,
        }
    }

    pub fn label(&self) -> String {
        format!("{} ({}x{})", self.name, self.rows, self.columns)
    }
}

/// Ordered navigator rows plus the highlighted row and the rows marked for
/// a bulk action. Only the view synchronizer inserts or removes rows.
#[derive(Debug, Default)]
pub struct Navigator {
    rows: Vec<NavigatorRow>,
    current: Option<usize>,
    marked: HashSet<String>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row at `index`, clamped to the end of the list
    pub fn insert_row(&mut self, index: usize, row: NavigatorRow) {
        let index = index.min(self.rows.len());
        self.rows.insert(index, row);
        if let Some(current) = self.current.as_mut() {
            if *current >= index {
                *current += 1;
            }
        }
    }

    /// Remove the row for `name`, returning its former position
    pub fn remove_row(&mut self, name: &str) -> Option<usize> {
        let position = self.position(name)?;
        self.rows.remove(position);
        self.marked.remove(name);
        self.current = match self.current {
            Some(current) if current == position => None,
            Some(current) if current > position => Some(current - 1),
            other => other,
        };
        Some(position)
    }

    pub fn update_shape(&mut self, name: &str, shape: (usize, usize)) {
        if let Some(row) = self.rows.iter_mut().find(|r| r.name == name) {
            row.rows = shape.0;
            row.columns = shape.1;
        }
    }

    /// Highlight the row for `name`, or nothing
    pub fn set_current(&mut self, name: Option<&str>) {
        self.current = name.and_then(|name| self.position(name));
    }

    pub fn current(&self) -> Option<&NavigatorRow> {
        self.current.and_then(|idx| self.rows.get(idx))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Name of the row after the current one, wrapping around
    pub fn next_name(&self) -> Option<&str> {
        if self.rows.is_empty() {
            return None;
        }
        let next = self.current.map_or(0, |idx| (idx + 1) % self.rows.len());
        Some(self.rows[next].name.as_str())
    }

    /// Name of the row before the current one, wrapping around
    pub fn prev_name(&self) -> Option<&str> {
        if self.rows.is_empty() {
            return None;
        }
        let prev = match self.current {
            Some(0) | None => self.rows.len() - 1,
            Some(idx) => idx - 1,
        };
        Some(self.rows[prev].name.as_str())
    }

    pub fn toggle_mark(&mut self, name: &str) {
        if !self.marked.remove(name) && self.position(name).is_some() {
            self.marked.insert(name.to_string());
        }
    }

    pub fn is_marked(&self, name: &str) -> bool {
        self.marked.contains(name)
    }

    /// Marked rows in display order; the current row alone when nothing is marked
    pub fn marked_or_current(&self) -> Vec<String> {
        let marked: Vec<String> = self
            .rows
            .iter()
            .filter(|row| self.marked.contains(&row.name))
            .map(|row| row.name.clone())
            .collect();
        if marked.is_empty() {
            self.current().map(|row| vec![row.name.clone()]).unwrap_or_default()
        } else {
            marked
        }
    }

    pub fn clear_marks(&mut self) {
        self.marked.clear();
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.marked.clear();
        self.current = None;
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.name == name)
    }

    pub fn rows(&self) -> &[NavigatorRow] {
        &self.rows
    }

    pub fn names(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigator(names: &[&str]) -> Navigator {
        let mut nav = Navigator::new();
        for (idx, name) in names.iter().enumerate() {
            nav.insert_row(idx, NavigatorRow::new(*name, (1, 1)));
        }
        nav
    }

    #[test]
    fn test_insert_keeps_current_row() {
        let mut nav = navigator(&["a", "b"]);
        nav.set_current(Some("b"));
        nav.insert_row(0, NavigatorRow::new("z", (0, 0)));
        assert_eq!(nav.current().unwrap().name, "b");
        assert_eq!(nav.names(), vec!["z", "a", "b"]);
    }

    #[test]
    fn test_remove_current_clears_highlight() {
        let mut nav = navigator(&["a", "b", "c"]);
        nav.set_current(Some("c"));
        assert_eq!(nav.remove_row("a"), Some(0));
        assert_eq!(nav.current().unwrap().name, "c");
        nav.remove_row("c");
        assert!(nav.current().is_none());
    }

    #[test]
    fn test_next_and_prev_wrap() {
        let mut nav = navigator(&["a", "b", "c"]);
        nav.set_current(Some("c"));
        assert_eq!(nav.next_name(), Some("a"));
        nav.set_current(Some("a"));
        assert_eq!(nav.prev_name(), Some("c"));
    }

    #[test]
    fn test_marked_or_current() {
        let mut nav = navigator(&["a", "b", "c"]);
        nav.set_current(Some("b"));
        assert_eq!(nav.marked_or_current(), vec!["b"]);

        nav.toggle_mark("c");
        nav.toggle_mark("a");
        nav.toggle_mark("missing");
        assert_eq!(nav.marked_or_current(), vec!["a", "c"]);

        nav.remove_row("a");
        assert!(!nav.is_marked("a"));
    }

    #[test]
    fn test_row_label_includes_shape() {
        assert_eq!(NavigatorRow::new("sales", (10, 3)).label(), "sales (10x3)");
    }
}
