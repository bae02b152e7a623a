use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;
use frameview::data::datatable::DataTable;
use frameview::store::AppStore;

/// Rows shown per dataset preview
const PREVIEW_ROWS: usize = 5;

/// One summary line per open dataset, selected one marked
pub fn store_summary(store: &AppStore) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        ["", "Dataset", "Rows", "Columns", "Source", "History"]
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
    );

    for entry in store.entries() {
        let (rows, columns) = entry.data().shape();
        let marker = if store.selected() == Some(entry.name()) {
            "*"
        } else {
            ""
        };
        table.add_row(vec![
            marker.to_string(),
            entry.name().to_string(),
            rows.to_string(),
            columns.to_string(),
            entry
                .source_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string()),
            entry.history().len().to_string(),
        ]);
    }
    table
}

/// The first few rows of a dataset
pub fn preview(data: &DataTable) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        data.columns
            .iter()
            .map(|c| Cell::new(&c.name).add_attribute(Attribute::Bold)),
    );
    for row in 0..data.row_count().min(PREVIEW_ROWS) {
        let cells: Vec<String> = data
            .get_row_as_strings(row)
            .unwrap_or_default()
            .into_iter()
            .map(|value| if value.is_empty() { "NULL".to_string() } else { value })
            .collect();
        table.add_row(cells);
    }
    table
}

pub fn display_store(store: &AppStore) {
    if store.is_empty() {
        println!("{}", "No datasets open.".yellow());
        return;
    }

    println!("{}", store_summary(store));
    for entry in store.entries() {
        println!("\n{}", entry.name().bold());
        println!("{}", preview(entry.data()));
        if entry.data().row_count() > PREVIEW_ROWS {
            println!(
                "{}",
                format!("... {} more rows", entry.data().row_count() - PREVIEW_ROWS).dark_grey()
            );
        }
    }
    println!("\n{}", format!("{} datasets open", store.len()).green());
}
