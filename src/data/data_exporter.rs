use crate::data::datatable::{DataTable, DataValue};
use crate::error::{Result, ViewerError};
use serde_json::Value;
use std::fs::File;
use std::ops::Range;
use std::path::Path;
use tracing::info;

/// Handles exporting datasets to files and to clipboard text
pub struct DataExporter;

impl DataExporter {
    /// Export the table to a CSV file, writing the header row first.
    pub fn export_csv(table: &DataTable, path: &Path) -> Result<String> {
        let mut writer = csv::Writer::from_path(path).map_err(|e| Self::csv_error(path, e))?;

        writer
            .write_record(table.column_names())
            .map_err(|e| Self::csv_error(path, e))?;
        for row in table.to_string_table() {
            writer
                .write_record(&row)
                .map_err(|e| Self::csv_error(path, e))?;
        }
        writer.flush().map_err(|e| ViewerError::io(path, e))?;

        info!("Exported {} rows to {}", table.row_count(), path.display());
        Ok(format!(
            "Exported {} rows to CSV file: {}",
            table.row_count(),
            path.display()
        ))
    }

    /// Export the table to a JSON array of objects.
    pub fn export_json(table: &DataTable, path: &Path) -> Result<String> {
        let headers = table.column_names();
        let json_array: Vec<Value> = table
            .rows
            .iter()
            .map(|row| {
                let mut json_obj = serde_json::Map::new();
                for (header, value) in headers.iter().zip(row.values.iter()) {
                    json_obj.insert(header.clone(), Self::to_json_value(value));
                }
                Value::Object(json_obj)
            })
            .collect();

        let file = File::create(path).map_err(|e| ViewerError::io(path, e))?;
        serde_json::to_writer_pretty(file, &json_array)
            .map_err(|e| ViewerError::format(path.display().to_string(), e))?;

        info!("Exported {} rows to {}", table.row_count(), path.display());
        Ok(format!(
            "Exported {} rows to JSON file: {}",
            table.row_count(),
            path.display()
        ))
    }

    /// Export by extension; anything that is not `.json` is written as CSV.
    pub fn export_file(table: &DataTable, path: &Path) -> Result<String> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::export_json(table, path),
            _ => Self::export_csv(table, path),
        }
    }

    /// Render a rectangular block of cells as tab-separated text.
    pub fn format_block_for_clipboard(
        table: &DataTable,
        rows: Range<usize>,
        columns: Range<usize>,
        with_headers: bool,
    ) -> String {
        let columns = columns.start.min(table.column_count())..columns.end.min(table.column_count());
        let rows = rows.start.min(table.row_count())..rows.end.min(table.row_count());
        let mut lines = Vec::with_capacity(rows.len() + 1);

        if with_headers {
            let header: Vec<&str> = table.columns[columns.clone()]
                .iter()
                .map(|c| c.name.as_str())
                .collect();
            lines.push(header.join("\t"));
        }

        for row_idx in rows {
            let cells: Vec<String> = columns
                .clone()
                .map(|col_idx| {
                    table
                        .get_value(row_idx, col_idx)
                        .map(|v| Self::escape_tsv_field(&v.to_string()))
                        .unwrap_or_default()
                })
                .collect();
            lines.push(cells.join("\t"));
        }

        lines.join("\n")
    }

    fn to_json_value(value: &DataValue) -> Value {
        match value {
            DataValue::String(s) | DataValue::DateTime(s) => Value::String(s.clone()),
            DataValue::Integer(i) => Value::from(*i),
            DataValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            DataValue::Boolean(b) => Value::Bool(*b),
            DataValue::Null => Value::Null,
        }
    }

    fn escape_tsv_field(field: &str) -> String {
        field.replace(['\t', '\n'], " ")
    }

    fn csv_error(path: &Path, err: csv::Error) -> ViewerError {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => ViewerError::io(path, io),
                other => ViewerError::format(path.display().to_string(), format!("{:?}", other)),
            }
        } else {
            ViewerError::format(path.display().to_string(), err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loaders::load_file;
    use tempfile::TempDir;

    fn sample() -> DataTable {
        DataTable::from_string_rows(
            "sample",
            vec!["id".to_string(), "note".to_string()],
            vec![
                vec!["1".to_string(), "hello, world".to_string()],
                vec!["2".to_string(), "plain".to_string()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_export_csv_can_be_reloaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.csv");

        DataExporter::export_csv(&sample(), &path).unwrap();
        let reloaded = load_file(&path).unwrap();

        assert_eq!(reloaded.shape(), (2, 2));
        assert_eq!(
            reloaded.get_value(0, 1),
            Some(&DataValue::String("hello, world".to_string()))
        );
    }

    #[test]
    fn test_export_json_writes_typed_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.json");

        DataExporter::export_file(&sample(), &path).unwrap();
        let written: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(written[0]["id"], Value::from(1));
    }

    #[test]
    fn test_export_to_missing_directory_is_io_error() {
        let err = DataExporter::export_csv(&sample(), Path::new("/no/such/dir/out.csv"))
            .unwrap_err();
        assert!(matches!(err, ViewerError::Io { .. }));
    }

    #[test]
    fn test_clipboard_block_with_and_without_headers() {
        let table = sample();
        assert_eq!(
            DataExporter::format_block_for_clipboard(&table, 0..1, 0..2, false),
            "1\thello, world"
        );
        assert_eq!(
            DataExporter::format_block_for_clipboard(&table, 1..2, 0..1, true),
            "id\n2"
        );
    }
}
