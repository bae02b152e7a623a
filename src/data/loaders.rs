use crate::data::datatable::DataTable;
use crate::error::{Result, ViewerError};
use csv::ReaderBuilder;
use serde_json::Value as JsonValue;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// Extensions accepted by the import action and the command line.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "tsv", "json"];

/// Name a dataset loaded from `path` is registered under: the file stem.
pub fn dataset_name_for_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string()
}

/// Load a file into a DataTable, picking the codec from the extension.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<DataTable> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let mut table = match extension.as_str() {
        "csv" => load_csv_to_datatable(path, b',')?,
        "tsv" => load_csv_to_datatable(path, b'\t')?,
        "json" => load_json_to_datatable(path)?,
        other => {
            return Err(ViewerError::format(
                path.display().to_string(),
                format!(
                    "unsupported extension '{}' (expected one of: {})",
                    other,
                    SUPPORTED_EXTENSIONS.join(", ")
                ),
            ))
        }
    };

    table
        .metadata
        .insert("source_path".to_string(), path.display().to_string());
    info!(
        "Loaded {} ({} rows, {} columns)",
        path.display(),
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

/// Load a delimited file into a DataTable
pub fn load_csv_to_datatable(path: &Path, delimiter: u8) -> Result<DataTable> {
    let file = File::open(path).map_err(|e| ViewerError::io(path, e))?;
    let table = read_delimited(
        file,
        delimiter,
        &dataset_name_for_path(path),
        &path.display().to_string(),
    )?;
    Ok(with_source_type(table, "csv"))
}

/// Load a JSON array of objects into a DataTable
pub fn load_json_to_datatable(path: &Path) -> Result<DataTable> {
    let source_name = path.display().to_string();
    let file = File::open(path).map_err(|e| ViewerError::io(path, e))?;
    let reader = BufReader::new(file);

    let json_data: Vec<JsonValue> = serde_json::from_reader(reader)
        .map_err(|e| ViewerError::format(source_name.as_str(), e))?;

    let table_name = dataset_name_for_path(path);
    if json_data.is_empty() {
        return Ok(with_source_type(DataTable::new(table_name), "json"));
    }

    let first_obj = json_data[0].as_object().ok_or_else(|| {
        ViewerError::format(source_name.as_str(), "JSON data must be an array of objects")
    })?;
    let column_names: Vec<String> = first_obj.keys().cloned().collect();

    let mut string_rows = Vec::with_capacity(json_data.len());
    for json_obj in &json_data {
        let obj = json_obj.as_object().ok_or_else(|| {
            ViewerError::format(source_name.as_str(), "JSON data must be an array of objects")
        })?;
        let row = column_names
            .iter()
            .map(|name| match obj.get(name) {
                Some(JsonValue::Null) | None => String::new(),
                Some(JsonValue::Bool(b)) => b.to_string(),
                Some(JsonValue::Number(n)) => n.to_string(),
                Some(JsonValue::String(s)) => s.clone(),
                Some(nested) => nested.to_string(),
            })
            .collect();
        string_rows.push(row);
    }

    let table = DataTable::from_string_rows(table_name, column_names, string_rows)
        .map_err(|e| ViewerError::format(source_name.as_str(), e))?;
    Ok(with_source_type(table, "json"))
}

/// Parse clipboard text (tab- or comma-separated, first line is the header).
pub fn load_delimited_text(text: &str, table_name: &str) -> Result<DataTable> {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.trim().is_empty() {
        return Err(ViewerError::format("clipboard", "clipboard is empty"));
    }
    let delimiter = if first_line.contains('\t') { b'\t' } else { b',' };
    debug!(
        "Parsing clipboard text with delimiter {:?}",
        delimiter as char
    );
    let table = read_delimited(text.as_bytes(), delimiter, table_name, "clipboard")?;
    Ok(with_source_type(table, "clipboard"))
}

fn read_delimited<R: Read>(
    reader: R,
    delimiter: u8,
    table_name: &str,
    source_name: &str,
) -> Result<DataTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ViewerError::format(source_name, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut string_rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| ViewerError::format(source_name, e))?;
        string_rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    DataTable::from_string_rows(table_name, headers, string_rows)
        .map_err(|e| ViewerError::format(source_name, e))
}

fn with_source_type(mut table: DataTable, source_type: &str) -> DataTable {
    table
        .metadata
        .insert("source_type".to_string(), source_type.to_string());
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::DataValue;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_csv_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "id,book,price").unwrap();
        writeln!(file, "1,FX,10.5").unwrap();
        writeln!(file, "2,Rates,11").unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.name, "trades");
        assert_eq!(table.shape(), (2, 3));
        assert_eq!(table.get_value(1, 2), Some(&DataValue::Float(11.0)));
        assert_eq!(table.metadata.get("source_type"), Some(&"csv".to_string()));
    }

    #[test]
    fn test_load_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("people.json");
        std::fs::write(
            &path,
            r#"[{"name": "Alice", "age": 30}, {"name": "Bob", "age": null}]"#,
        )
        .unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.shape(), (2, 2));
        let age = table
            .column_names()
            .iter()
            .position(|name| name == "age")
            .unwrap();
        assert_eq!(table.get_value(1, age), Some(&DataValue::Null));
    }

    #[test]
    fn test_unsupported_extension_is_format_error() {
        let err = load_file("report.xlsx").unwrap_err();
        assert!(matches!(err, ViewerError::Format { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_file("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, ViewerError::Io { .. }));
    }

    #[test]
    fn test_load_clipboard_text_tab_separated() {
        let table = load_delimited_text("a\tb\n1\tx\n2\ty\n", "clip").unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_load_empty_clipboard_text_fails() {
        assert!(load_delimited_text("", "clip").is_err());
    }
}
