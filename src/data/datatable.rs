use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A table shared between the store, the caller's scope and the panels.
/// Identity (`Arc::ptr_eq`) is what the name resolver matches on.
pub type SharedTable = Arc<DataTable>;

/// Rows sampled when guessing column types from text
const TYPE_SAMPLE_ROWS: usize = 100;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    String,
    Integer,
    Float,
    Boolean,
    DateTime,
    Null,
    /// Column holds values of incompatible types
    Mixed,
}

impl DataType {
    /// Guess the type of a single text cell
    pub fn infer_from_string(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("null") {
            DataType::Null
        } else if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            DataType::Boolean
        } else if value.parse::<i64>().is_ok() {
            DataType::Integer
        } else if value.parse::<f64>().is_ok() {
            DataType::Float
        } else if looks_like_datetime(value) {
            DataType::DateTime
        } else {
            DataType::String
        }
    }

    /// Common type of two values in one column. Null gives way to anything;
    /// integers widen to floats; any other disagreement is `Mixed`.
    pub fn merge(self, other: DataType) -> DataType {
        match (self, other) {
            (a, b) if a == b => a,
            (DataType::Null, t) | (t, DataType::Null) => t,
            (DataType::Integer, DataType::Float) | (DataType::Float, DataType::Integer) => {
                DataType::Float
            }
            _ => DataType::Mixed,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }
}

fn looks_like_datetime(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || DATETIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(value, format).is_ok())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataColumn {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub null_count: usize,
}

impl DataColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::String,
            nullable: true,
            null_count: 0,
        }
    }
}

/// One cell of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Kept as the text it was read from
    DateTime(String),
    Null,
}

impl DataValue {
    /// Parse `text` as `data_type`, falling back to a string when it does not fit.
    /// `Mixed` infers the type of this one cell.
    pub fn from_string(text: &str, data_type: &DataType) -> Self {
        if text.is_empty() || text.eq_ignore_ascii_case("null") {
            return DataValue::Null;
        }

        let as_text = || DataValue::String(text.to_string());
        match data_type {
            DataType::Integer => text.parse().map(DataValue::Integer).unwrap_or_else(|_| as_text()),
            DataType::Float => text.parse().map(DataValue::Float).unwrap_or_else(|_| as_text()),
            DataType::Boolean => DataValue::Boolean(matches!(
                text.to_ascii_lowercase().as_str(),
                "true" | "1" | "yes"
            )),
            DataType::DateTime => DataValue::DateTime(text.to_string()),
            DataType::Null => DataValue::Null,
            DataType::Mixed => Self::from_string(text, &DataType::infer_from_string(text)),
            DataType::String => as_text(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            DataValue::String(_) => DataType::String,
            DataValue::Integer(_) => DataType::Integer,
            DataValue::Float(_) => DataType::Float,
            DataValue::Boolean(_) => DataType::Boolean,
            DataValue::DateTime(_) => DataType::DateTime,
            DataValue::Null => DataType::Null,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Integer(i) => Some(*i as f64),
            DataValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::String(s) | DataValue::DateTime(s) => f.write_str(s),
            DataValue::Integer(i) => write!(f, "{}", i),
            DataValue::Float(x) => write!(f, "{}", x),
            DataValue::Boolean(b) => write!(f, "{}", b),
            DataValue::Null => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    pub values: Vec<DataValue>,
}

impl DataRow {
    pub fn new(values: Vec<DataValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&DataValue> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A single-cell change produced by an in-UI edit (typing, paste).
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    pub row: usize,
    pub column: usize,
    pub value: DataValue,
}

/// The dataset payload: named columns, rows of cells and free-form metadata
/// (`source_path`, `source_type`) set by the loaders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub name: String,
    pub columns: Vec<DataColumn>,
    pub rows: Vec<DataRow>,
    pub metadata: HashMap<String, String>,
}

impl DataTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Build a table from headers and text cells. Column types are guessed
    /// from the first rows, then every cell is parsed with its column's type.
    pub fn from_string_rows(
        name: impl Into<String>,
        headers: Vec<String>,
        string_rows: Vec<Vec<String>>,
    ) -> Result<Self, String> {
        let width = headers.len();
        if let Some((idx, bad)) = string_rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != width)
        {
            return Err(format!(
                "Row {} has {} values but table has {} columns",
                idx,
                bad.len(),
                width
            ));
        }

        let mut column_types = vec![DataType::Null; width];
        for row in string_rows.iter().take(TYPE_SAMPLE_ROWS) {
            for (slot, cell) in column_types.iter_mut().zip(row) {
                *slot = slot.merge(DataType::infer_from_string(cell));
            }
        }

        let mut table = DataTable::new(name);
        table.columns = headers.into_iter().map(DataColumn::new).collect();
        table.rows = string_rows
            .iter()
            .map(|row| {
                DataRow::new(
                    row.iter()
                        .zip(&column_types)
                        .map(|(cell, data_type)| DataValue::from_string(cell, data_type))
                        .collect(),
                )
            })
            .collect();
        table.infer_column_types();
        Ok(table)
    }

    pub fn add_column(&mut self, column: DataColumn) -> &mut Self {
        self.columns.push(column);
        self
    }

    pub fn add_row(&mut self, row: DataRow) -> Result<(), String> {
        if row.len() != self.columns.len() {
            return Err(format!(
                "Row has {} values but table has {} columns",
                row.len(),
                self.columns.len()
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Recompute type and null statistics of every column from the cells
    pub fn infer_column_types(&mut self) {
        for (col_idx, column) in self.columns.iter_mut().enumerate() {
            let cells = self.rows.iter().filter_map(|row| row.get(col_idx));
            let (data_type, nulls) = cells.fold((DataType::Null, 0), |(ty, nulls), value| {
                if value.is_null() {
                    (ty, nulls + 1)
                } else {
                    (ty.merge(value.data_type()), nulls)
                }
            });
            column.data_type = data_type;
            column.null_count = nulls;
            column.nullable = nulls > 0;
        }
    }

    pub fn get_value(&self, row: usize, col: usize) -> Option<&DataValue> {
        self.rows.get(row)?.get(col)
    }

    /// Apply a single edit, returning the previous value.
    pub fn apply_edit(&mut self, edit: &CellEdit) -> Result<DataValue, String> {
        let (height, width) = self.shape();
        let cell = self
            .rows
            .get_mut(edit.row)
            .and_then(|row| row.values.get_mut(edit.column))
            .ok_or_else(|| {
                format!(
                    "Cell ({}, {}) is outside the {}x{} table",
                    edit.row, edit.column, height, width
                )
            })?;
        Ok(std::mem::replace(cell, edit.value.clone()))
    }

    /// Every row rendered as display strings
    pub fn to_string_table(&self) -> Vec<Vec<String>> {
        (0..self.row_count())
            .filter_map(|idx| self.get_row_as_strings(idx))
            .collect()
    }

    pub fn get_row_as_strings(&self, index: usize) -> Option<Vec<String>> {
        self.rows
            .get(index)
            .map(|row| row.values.iter().map(ToString::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_data_type_inference() {
        assert_eq!(DataType::infer_from_string("123"), DataType::Integer);
        assert_eq!(DataType::infer_from_string("123.45"), DataType::Float);
        assert_eq!(DataType::infer_from_string("TRUE"), DataType::Boolean);
        assert_eq!(DataType::infer_from_string("hello"), DataType::String);
        assert_eq!(DataType::infer_from_string(""), DataType::Null);
        assert_eq!(DataType::infer_from_string("2024-01-01"), DataType::DateTime);
        assert_eq!(
            DataType::infer_from_string("2024-01-01 09:30:00"),
            DataType::DateTime
        );
        assert_eq!(DataType::infer_from_string("FX-SPOT-01"), DataType::String);
    }

    #[test]
    fn test_from_string_rows_infers_types() {
        let table = DataTable::from_string_rows(
            "people",
            strings(&["id", "name", "score"]),
            vec![strings(&["1", "Alice", "3.5"]), strings(&["2", "Bob", ""])],
        )
        .unwrap();

        assert_eq!(table.shape(), (2, 3));
        assert_eq!(table.columns[0].data_type, DataType::Integer);
        assert_eq!(table.columns[2].data_type, DataType::Float);
        assert_eq!(table.columns[2].null_count, 1);
        assert_eq!(
            table.get_value(1, 1),
            Some(&DataValue::String("Bob".to_string()))
        );
    }

    #[test]
    fn test_from_string_rows_rejects_ragged_rows() {
        let result = DataTable::from_string_rows("bad", strings(&["a", "b"]), vec![strings(&["1"])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_edit_returns_previous_value() {
        let mut table = DataTable::new("t");
        table.add_column(DataColumn::new("x"));
        table
            .add_row(DataRow::new(vec![DataValue::Integer(1)]))
            .unwrap();

        let previous = table
            .apply_edit(&CellEdit {
                row: 0,
                column: 0,
                value: DataValue::Integer(9),
            })
            .unwrap();

        assert_eq!(previous, DataValue::Integer(1));
        assert_eq!(table.get_value(0, 0), Some(&DataValue::Integer(9)));
        assert!(table
            .apply_edit(&CellEdit {
                row: 4,
                column: 0,
                value: DataValue::Null,
            })
            .is_err());
    }

    #[test]
    fn test_integer_and_float_cells_merge_to_float() {
        let mut table = DataTable::new("test");
        table.add_column(DataColumn::new("mixed"));
        for value in [DataValue::Integer(1), DataValue::Float(2.5), DataValue::Null] {
            table.add_row(DataRow::new(vec![value])).unwrap();
        }

        table.infer_column_types();

        assert_eq!(table.columns[0].data_type, DataType::Float);
        assert_eq!(table.columns[0].null_count, 1);
        assert!(table.columns[0].nullable);
    }

    #[test]
    fn test_text_in_numeric_column_makes_it_mixed() {
        assert_eq!(DataType::Integer.merge(DataType::String), DataType::Mixed);
        assert_eq!(DataType::Null.merge(DataType::Boolean), DataType::Boolean);
    }
}
