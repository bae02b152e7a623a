//! Cell text search behind the Find prompt
//!
//! Plain text matches case-insensitively anywhere in a cell's displayed
//! value. A pattern wrapped in slashes (`/^FX-\d+$/`) is compiled as a
//! case-insensitive regular expression instead.

use crate::data::datatable::DataTable;
use crate::error::{Result, ViewerError};
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Which way Find walks the table from the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone)]
enum Matcher {
    /// Lowercased needle for substring matching
    Text(String),
    Regex(Regex),
}

/// A compiled Find pattern
#[derive(Debug, Clone)]
pub struct CellSearch {
    pattern: String,
    matcher: Matcher,
}

impl CellSearch {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(ViewerError::format("search", "search pattern is empty"));
        }

        let matcher = match pattern.strip_prefix('/').and_then(|p| p.strip_suffix('/')) {
            Some(expr) if !expr.is_empty() => {
                let regex = RegexBuilder::new(expr)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ViewerError::format("search", e))?;
                Matcher::Regex(regex)
            }
            _ => Matcher::Text(pattern.to_lowercase()),
        };

        debug!("Compiled search pattern '{}'", pattern);
        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Text(needle) => text.to_lowercase().contains(needle.as_str()),
            Matcher::Regex(regex) => regex.is_match(text),
        }
    }

    fn cell_matches(&self, table: &DataTable, row: usize, col: usize) -> bool {
        table
            .get_value(row, col)
            .is_some_and(|value| self.is_match(&value.to_string()))
    }

    /// Every matching cell, row by row
    pub fn matches(&self, table: &DataTable) -> Vec<(usize, usize)> {
        let width = table.column_count();
        (0..table.row_count())
            .flat_map(|row| (0..width).map(move |col| (row, col)))
            .filter(|&(row, col)| self.cell_matches(table, row, col))
            .collect()
    }

    /// Next matching cell after `from` in reading order, wrapping around the
    /// table. `from` itself is checked last, so a lone match is found again.
    pub fn find_from(
        &self,
        table: &DataTable,
        from: (usize, usize),
        direction: SearchDirection,
    ) -> Option<(usize, usize)> {
        let width = table.column_count();
        let total = table.row_count() * width;
        if total == 0 {
            return None;
        }
        let start = (from.0 * width + from.1).min(total - 1);

        (1..=total)
            .map(|step| match direction {
                SearchDirection::Forward => (start + step) % total,
                SearchDirection::Backward => (start + total - step) % total,
            })
            .map(|idx| (idx / width, idx % width))
            .find(|&(row, col)| self.cell_matches(table, row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trades() -> DataTable {
        let rows = [
            ["FX-001", "London", "10"],
            ["RATES-7", "Paris", "20"],
            ["FX-002", "london", "30"],
        ];
        DataTable::from_string_rows(
            "trades",
            vec!["id".into(), "city".into(), "qty".into()],
            rows.iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_text_search_is_case_insensitive() {
        let search = CellSearch::new("LONDON").unwrap();
        assert_eq!(search.matches(&trades()), vec![(0, 1), (2, 1)]);
    }

    #[test]
    fn test_find_moves_forward_from_cursor() {
        let search = CellSearch::new("london").unwrap();
        let found = search.find_from(&trades(), (0, 1), SearchDirection::Forward);
        assert_eq!(found, Some((2, 1)));
    }

    #[test]
    fn test_find_wraps_around_both_ways() {
        let table = trades();
        let search = CellSearch::new("fx-").unwrap();
        assert_eq!(
            search.find_from(&table, (2, 0), SearchDirection::Forward),
            Some((0, 0))
        );
        assert_eq!(
            search.find_from(&table, (0, 0), SearchDirection::Backward),
            Some((2, 0))
        );
    }

    #[test]
    fn test_single_match_is_found_from_itself() {
        let search = CellSearch::new("paris").unwrap();
        assert_eq!(
            search.find_from(&trades(), (1, 1), SearchDirection::Forward),
            Some((1, 1))
        );
    }

    #[test]
    fn test_no_match_returns_none() {
        let search = CellSearch::new("Tokyo").unwrap();
        assert_eq!(
            search.find_from(&trades(), (0, 0), SearchDirection::Forward),
            None
        );
        assert!(search.matches(&trades()).is_empty());
        assert_eq!(
            search.find_from(&DataTable::new("empty"), (0, 0), SearchDirection::Forward),
            None
        );
    }

    #[test]
    fn test_slash_pattern_is_a_regex() {
        let search = CellSearch::new(r"/^fx-\d+$/").unwrap();
        assert_eq!(search.matches(&trades()), vec![(0, 0), (2, 0)]);
    }

    #[test]
    fn test_bad_pattern_is_rejected() {
        assert!(matches!(
            CellSearch::new("/([/"),
            Err(ViewerError::Format { .. })
        ));
        assert!(CellSearch::new("   ").is_err());
    }
}
