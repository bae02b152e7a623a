use crate::data::datatable::{DataColumn, DataRow, DataTable, DataType, DataValue};
use std::collections::HashSet;

/// Statistics for a single column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStatistics {
    pub column_name: String,
    pub data_type: DataType,
    pub total_values: usize,
    pub null_values: usize,
    pub unique_values: usize,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub mean_value: Option<f64>,
}

/// Analyzes a table column by column for the statistics view
pub struct DataAnalyzer;

impl DataAnalyzer {
    pub fn column_statistics(table: &DataTable, col_idx: usize) -> Option<ColumnStatistics> {
        let column = table.columns.get(col_idx)?;
        let mut stats = ColumnStatistics {
            column_name: column.name.clone(),
            data_type: column.data_type.clone(),
            total_values: table.row_count(),
            null_values: 0,
            unique_values: 0,
            min_value: None,
            max_value: None,
            mean_value: None,
        };

        let mut unique = HashSet::new();
        let mut numeric_values = Vec::new();
        let mut min_str: Option<String> = None;
        let mut max_str: Option<String> = None;

        for value in table.rows.iter().filter_map(|row| row.get(col_idx)) {
            if value.is_null() {
                stats.null_values += 1;
                continue;
            }
            let text = value.to_string();
            if let Some(num) = value.as_f64() {
                numeric_values.push(num);
            }
            if min_str.as_ref().map_or(true, |min| &text < min) {
                min_str = Some(text.clone());
            }
            if max_str.as_ref().map_or(true, |max| &text > max) {
                max_str = Some(text.clone());
            }
            unique.insert(text);
        }
        stats.unique_values = unique.len();

        if column.data_type.is_numeric() && !numeric_values.is_empty() {
            let sum: f64 = numeric_values.iter().sum();
            stats.mean_value = Some(sum / numeric_values.len() as f64);
            let min = numeric_values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = numeric_values
                .iter()
                .cloned()
                .fold(f64::NEG_INFINITY, f64::max);
            stats.min_value = Some(min.to_string());
            stats.max_value = Some(max.to_string());
        } else {
            stats.min_value = min_str;
            stats.max_value = max_str;
        }

        Some(stats)
    }

    pub fn all_statistics(table: &DataTable) -> Vec<ColumnStatistics> {
        (0..table.column_count())
            .filter_map(|idx| Self::column_statistics(table, idx))
            .collect()
    }

    /// The statistics view as a table of its own, one row per source column.
    pub fn statistics_table(table: &DataTable) -> DataTable {
        let mut stats_table = DataTable::new(format!("{} (statistics)", table.name));
        for header in ["column", "type", "count", "nulls", "unique", "min", "max", "mean"] {
            stats_table.add_column(DataColumn::new(header));
        }

        for stats in Self::all_statistics(table) {
            let optional = |value: Option<String>| value.map_or(DataValue::Null, DataValue::String);
            let row = DataRow::new(vec![
                DataValue::String(stats.column_name),
                DataValue::String(format!("{:?}", stats.data_type)),
                DataValue::Integer(stats.total_values as i64),
                DataValue::Integer(stats.null_values as i64),
                DataValue::Integer(stats.unique_values as i64),
                optional(stats.min_value),
                optional(stats.max_value),
                stats.mean_value.map_or(DataValue::Null, DataValue::Float),
            ]);
            // Every row has exactly the eight columns declared above
            let _ = stats_table.add_row(row);
        }

        stats_table.infer_column_types();
        stats_table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataTable {
        DataTable::from_string_rows(
            "scores",
            vec!["name".to_string(), "score".to_string()],
            vec![
                vec!["b".to_string(), "10".to_string()],
                vec!["a".to_string(), "20".to_string()],
                vec!["a".to_string(), "".to_string()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_numeric_column_statistics() {
        let stats = DataAnalyzer::column_statistics(&sample(), 1).unwrap();
        assert_eq!(stats.null_values, 1);
        assert_eq!(stats.unique_values, 2);
        assert_eq!(stats.mean_value, Some(15.0));
        assert_eq!(stats.min_value.as_deref(), Some("10"));
        assert_eq!(stats.max_value.as_deref(), Some("20"));
    }

    #[test]
    fn test_string_column_statistics() {
        let stats = DataAnalyzer::column_statistics(&sample(), 0).unwrap();
        assert_eq!(stats.unique_values, 2);
        assert_eq!(stats.min_value.as_deref(), Some("a"));
        assert_eq!(stats.mean_value, None);
    }

    #[test]
    fn test_statistics_table_has_row_per_column() {
        let stats = DataAnalyzer::statistics_table(&sample());
        assert_eq!(stats.shape(), (2, 8));
        assert_eq!(
            stats.get_value(1, 0),
            Some(&DataValue::String("score".to_string()))
        );
    }
}
