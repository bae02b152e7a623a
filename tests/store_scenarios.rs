use anyhow::Result;
use frameview::data::datatable::{CellEdit, DataColumn, DataRow, DataTable, DataValue, SharedTable};
use frameview::state::StoreEvent;
use frameview::store::{AppStore, CallerScope, Lookup};
use frameview::ViewerError;
use std::sync::Arc;

fn table(label: &str, rows: i64) -> SharedTable {
    let mut table = DataTable::new(label);
    table.add_column(DataColumn::new("n"));
    for i in 0..rows {
        table
            .add_row(DataRow::new(vec![DataValue::Integer(i)]))
            .unwrap();
    }
    Arc::new(table)
}

fn assert_selection_valid(store: &AppStore) {
    if let Some(selected) = store.selected() {
        assert!(
            store.contains(selected),
            "selected '{}' is not in the store",
            selected
        );
    }
}

#[test]
fn test_selection_stays_valid_through_mixed_operations() -> Result<()> {
    let mut store = AppStore::default();
    let scope = CallerScope::new();

    for name in ["a", "b", "c", "d"] {
        store.add(table(name, 1), Some(name), &scope);
        assert_selection_valid(&store);
    }
    store.select("c")?;
    assert_selection_valid(&store);

    for name in ["c", "a", "d"] {
        store.remove(name)?;
        assert_selection_valid(&store);
    }
    assert!(store.select("a").is_err());
    assert_selection_valid(&store);

    store.remove("b")?;
    assert_selection_valid(&store);
    assert_eq!(store.selected(), None);

    Ok(())
}

#[test]
fn test_add_resolves_name_from_scope_identity() -> Result<()> {
    let mut store = AppStore::default();
    let foo = table("payload", 3);
    let scope = CallerScope::new().bind("foo", &foo);

    let name = store.add(foo.clone(), None, &scope);

    assert_eq!(name, "foo");
    assert!(store.entry("foo").unwrap().holds(&foo));
    Ok(())
}

#[test]
fn test_unmatched_payloads_are_numbered_per_batch() -> Result<()> {
    let mut store = AppStore::default();
    let scope = CallerScope::new();

    let names = store.add_many(vec![(None, table("x", 1)), (None, table("y", 1))], &scope);

    assert_eq!(names, vec!["untitled_1", "untitled_2"]);
    Ok(())
}

#[test]
fn test_refresh_preserves_position_selection_and_clears_history() -> Result<()> {
    let mut store = AppStore::default();
    let scope = CallerScope::new();
    for name in ["a", "b", "c"] {
        store.add(table(name, 2), Some(name), &scope);
    }
    store.select("b")?;
    store.record_edit("b", "edit cell (0, 0)")?;

    let replacement = table("b2", 5);
    store.refresh("b", replacement.clone())?;

    assert_eq!(store.names(), vec!["a", "b", "c"]);
    assert_eq!(store.position("b"), Some(1));
    assert_eq!(store.selected(), Some("b"));
    let entry = store.entry("b").unwrap();
    assert!(entry.history().is_empty());
    assert!(entry.holds(&replacement));
    Ok(())
}

#[test]
fn test_remove_selected_moves_to_predecessor_then_none() -> Result<()> {
    let mut store = AppStore::default();
    let scope = CallerScope::new();
    for name in ["a", "b", "c"] {
        store.add(table(name, 1), Some(name), &scope);
    }

    store.select("c")?;
    store.remove("c")?;
    assert_eq!(store.selected(), Some("b"));

    store.remove("b")?;
    assert_eq!(store.selected(), Some("a"));

    store.remove("a")?;
    assert_eq!(store.selected(), None);
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn test_remove_first_selected_clears_selection() -> Result<()> {
    let mut store = AppStore::default();
    let scope = CallerScope::new();
    for name in ["a", "b", "c"] {
        store.add(table(name, 1), Some(name), &scope);
    }
    assert_eq!(store.selected(), Some("a"));
    store.drain_events();

    store.remove("a")?;

    assert_eq!(store.selected(), None);
    assert_eq!(store.names(), vec!["b", "c"]);
    assert_eq!(
        store.drain_events(),
        vec![StoreEvent::removed("a"), StoreEvent::selected(None)]
    );

    store.select("c")?;
    store.remove("c")?;
    assert_eq!(store.selected(), Some("b"));
    Ok(())
}

#[test]
fn test_remove_missing_has_no_side_effects() -> Result<()> {
    let mut store = AppStore::default();
    store.add(table("a", 1), Some("a"), &CallerScope::new());
    let before = store.names();
    store.drain_events();

    match store.remove("missing") {
        Err(ViewerError::NotFound { names }) => assert_eq!(names, vec!["missing"]),
        other => panic!("expected NotFound, got {:?}", other.map(|e| e.name().to_string())),
    }

    assert_eq!(store.names(), before);
    assert_eq!(store.selected(), Some("a"));
    assert!(store.drain_events().is_empty());
    Ok(())
}

#[test]
fn test_adding_same_name_twice_replaces_payload() -> Result<()> {
    let mut store = AppStore::default();
    let scope = CallerScope::new();
    let df1 = table("df1", 1);
    let df2 = table("df2", 2);

    store.add(df1, Some("sales"), &scope);
    store.record_edit("sales", "edit cell (0, 0)")?;
    store.add(df2.clone(), Some("sales"), &scope);

    assert_eq!(store.names(), vec!["sales"]);
    let entry = store.entry("sales").unwrap();
    assert!(entry.holds(&df2));
    assert!(entry.history().is_empty());

    match store.get(Some(&["sales"]))? {
        Lookup::One(payload) => assert!(Arc::ptr_eq(&payload, &df2)),
        Lookup::Many(_) => panic!("expected a single payload"),
    }
    Ok(())
}

#[test]
fn test_events_arrive_in_mutation_order() -> Result<()> {
    let mut store = AppStore::default();
    let scope = CallerScope::new();

    store.add(table("a", 1), Some("a"), &scope);
    store.add(table("b", 1), Some("b"), &scope);
    store.select("b")?;
    store.refresh("b", table("b2", 1))?;
    store.remove("b")?;

    assert_eq!(
        store.drain_events(),
        vec![
            StoreEvent::added("a", 0),
            StoreEvent::selected(Some("a")),
            StoreEvent::added("b", 1),
            StoreEvent::selected(Some("b")),
            StoreEvent::removed("b"),
            StoreEvent::added("b", 1),
            StoreEvent::selected(Some("b")),
            StoreEvent::removed("b"),
            StoreEvent::selected(Some("a")),
        ]
    );
    Ok(())
}

#[test]
fn test_edits_do_not_touch_the_callers_table() -> Result<()> {
    let mut store = AppStore::default();
    let original = table("t", 2);
    store.add(original.clone(), Some("t"), &CallerScope::new());

    store.apply_cell_edits(
        "t",
        &[CellEdit {
            row: 1,
            column: 0,
            value: DataValue::Integer(99),
        }],
    )?;

    assert_eq!(original.get_value(1, 0), Some(&DataValue::Integer(1)));
    let edited = store.get(Some(&["t"]))?.into_single().unwrap();
    assert_eq!(edited.get_value(1, 0), Some(&DataValue::Integer(99)));
    // The store now holds its own copy
    assert!(!store.entry("t").unwrap().holds(&original));
    Ok(())
}

#[test]
fn test_separate_stores_share_nothing() -> Result<()> {
    let shared = table("shared", 1);
    let mut first = AppStore::default();
    let mut second = AppStore::default();

    first.add(shared.clone(), Some("t"), &CallerScope::new());
    second.add(shared, Some("t"), &CallerScope::new());
    first.remove("t")?;

    assert!(first.is_empty());
    assert_eq!(second.names(), vec!["t"]);
    Ok(())
}
