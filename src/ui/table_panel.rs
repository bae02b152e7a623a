use crate::data::cell_search::{CellSearch, SearchDirection};
use crate::data::clipboard::TextClipboard;
use crate::data::data_analyzer::DataAnalyzer;
use crate::data::data_exporter::DataExporter;
use crate::data::datatable::{CellEdit, DataTable, DataType, DataValue, SharedTable};
use crate::error::{Result, ViewerError};
use crate::state::panel::{Panel, PanelFactory};
use crate::store::{DatasetEntry, ViewMode};
use std::ops::Range;
use tracing::{debug, info};

/// Grid panel for one dataset: the data itself or its column statistics,
/// with a cell cursor and an optional block selection.
#[derive(Debug)]
pub struct TablePanel {
    name: String,
    data: SharedTable,
    view_mode: ViewMode,
    stats: Option<DataTable>,
    cursor: (usize, usize),
    anchor: Option<(usize, usize)>,
    active: bool,
    released: bool,
}

impl TablePanel {
    pub fn new(entry: &DatasetEntry) -> Self {
        let mut panel = Self {
            name: entry.name().to_string(),
            data: entry.data().clone(),
            view_mode: ViewMode::Data,
            stats: None,
            cursor: (0, 0),
            anchor: None,
            active: false,
            released: false,
        };
        panel.reload(entry);
        panel
    }

    /// The table currently on screen
    pub fn displayed(&self) -> &DataTable {
        match (&self.view_mode, &self.stats) {
            (ViewMode::Statistics, Some(stats)) => stats,
            _ => &self.data,
        }
    }

    pub fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    /// Move the cursor, clamped to the displayed table
    pub fn move_cursor(&mut self, rows: isize, columns: isize) {
        let (height, width) = self.displayed().shape();
        let step = |value: usize, delta: isize, limit: usize| -> usize {
            if limit == 0 {
                return 0;
            }
            let moved = value as isize + delta;
            moved.clamp(0, limit as isize - 1) as usize
        };
        self.cursor = (
            step(self.cursor.0, rows, height),
            step(self.cursor.1, columns, width),
        );
    }

    /// Move the cursor to the next cell of the displayed table matching `search`
    pub fn find(
        &mut self,
        search: &CellSearch,
        direction: SearchDirection,
    ) -> Option<(usize, usize)> {
        let found = search.find_from(self.displayed(), self.cursor, direction)?;
        debug!("'{}' matched {:?} in {}", search.pattern(), found, self.name);
        self.cursor = found;
        Some(found)
    }

    /// Start a block selection at the cursor, or drop the current one
    pub fn toggle_block_selection(&mut self) {
        self.anchor = match self.anchor {
            Some(_) => None,
            None => Some(self.cursor),
        };
    }

    pub fn has_block_selection(&self) -> bool {
        self.anchor.is_some()
    }

    /// Selected rows and columns: the block between anchor and cursor, or the cursor cell
    pub fn selection(&self) -> (Range<usize>, Range<usize>) {
        let (row, col) = self.cursor;
        let (anchor_row, anchor_col) = self.anchor.unwrap_or(self.cursor);
        (
            row.min(anchor_row)..row.max(anchor_row) + 1,
            col.min(anchor_col)..col.max(anchor_col) + 1,
        )
    }

    pub fn is_selected(&self, row: usize, col: usize) -> bool {
        let (rows, columns) = self.selection();
        rows.contains(&row) && columns.contains(&col)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn clamp_cursor(&mut self) {
        self.move_cursor(0, 0);
        if let Some((row, col)) = self.anchor {
            let (height, width) = self.displayed().shape();
            if row >= height || col >= width {
                self.anchor = None;
            }
        }
    }
}

impl Panel for TablePanel {
    fn name(&self) -> &str {
        &self.name
    }

    fn activate(&mut self) {
        debug!("TablePanel '{}' activated", self.name);
        self.active = true;
    }

    fn deactivate(&mut self) {
        debug!("TablePanel '{}' deactivated", self.name);
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn copy_selection(
        &self,
        clipboard: &mut dyn TextClipboard,
        with_headers: bool,
    ) -> Result<usize> {
        let (rows, columns) = self.selection();
        let table = self.displayed();
        if table.is_empty() {
            return Ok(0);
        }
        let cells = rows.len().min(table.row_count()) * columns.len().min(table.column_count());
        let text = DataExporter::format_block_for_clipboard(table, rows, columns, with_headers);
        clipboard.set_text(&text)?;
        info!("Copied {} cells from '{}'", cells, self.name);
        Ok(cells)
    }

    fn paste(&self, clipboard: &mut dyn TextClipboard) -> Result<Vec<CellEdit>> {
        if self.view_mode != ViewMode::Data {
            return Err(ViewerError::format(
                "clipboard",
                "paste is only available in the data view",
            ));
        }

        let text = clipboard.get_text()?;
        let (height, width) = self.data.shape();
        let (start_row, start_col) = self.cursor;

        let edits: Vec<CellEdit> = text
            .lines()
            .enumerate()
            .take_while(|(offset, _)| start_row + offset < height)
            .flat_map(|(row_offset, line)| {
                line.split('\t')
                    .enumerate()
                    .take_while(move |(offset, _)| start_col + offset < width)
                    .map(move |(col_offset, cell)| CellEdit {
                        row: start_row + row_offset,
                        column: start_col + col_offset,
                        value: DataValue::from_string(cell, &DataType::Mixed),
                    })
            })
            .collect();

        debug!("Paste into '{}' produced {} edits", self.name, edits.len());
        Ok(edits)
    }

    fn active_view_mode(&self) -> ViewMode {
        self.view_mode
    }

    fn reload(&mut self, entry: &DatasetEntry) {
        self.data = entry.data().clone();
        self.view_mode = entry.view_mode();
        self.stats = match self.view_mode {
            ViewMode::Statistics => Some(DataAnalyzer::statistics_table(&self.data)),
            ViewMode::Data => None,
        };
        self.clamp_cursor();
    }

    fn release(&mut self) {
        if !self.released {
            debug!("TablePanel '{}' released", self.name);
            self.stats = None;
            self.anchor = None;
            self.released = true;
        }
    }
}

/// Creates a [`TablePanel`] for every entry the store adds
#[derive(Debug, Default)]
pub struct TablePanelFactory {
    created: usize,
}

impl TablePanelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> usize {
        self.created
    }
}

impl PanelFactory for TablePanelFactory {
    type Panel = TablePanel;

    fn create(&mut self, entry: &DatasetEntry) -> TablePanel {
        self.created += 1;
        TablePanel::new(entry)
    }
}
