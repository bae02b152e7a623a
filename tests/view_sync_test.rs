use anyhow::Result;
use frameview::data::clipboard::MemoryClipboard;
use frameview::data::datatable::{DataTable, SharedTable};
use frameview::state::{Panel, SyncState, ViewSynchronizer};
use frameview::store::{AppStore, CallerScope, ViewMode};
use frameview::ui::TablePanelFactory;
use std::sync::Arc;

fn grid(rows: usize) -> SharedTable {
    let data: Vec<Vec<String>> = (0..rows)
        .map(|i| vec![i.to_string(), format!("name_{}", i)])
        .collect();
    Arc::new(DataTable::from_string_rows("grid", vec!["id".into(), "name".into()], data).unwrap())
}

fn setup() -> (AppStore, ViewSynchronizer<TablePanelFactory>) {
    (
        AppStore::default(),
        ViewSynchronizer::new(TablePanelFactory::new()),
    )
}

#[test]
fn test_view_follows_store_through_a_session() -> Result<()> {
    let (mut store, mut sync) = setup();
    let scope = CallerScope::new();

    store.add_many(
        vec![
            (Some("a".into()), grid(2)),
            (Some("b".into()), grid(3)),
            (Some("c".into()), grid(4)),
        ],
        &scope,
    );
    sync.sync(&mut store)?;
    assert!(sync.is_consistent_with(&store));
    assert_eq!(sync.factory().created(), 3);
    assert!(sync.visible_panel().unwrap().is_active());

    store.select("c")?;
    sync.sync(&mut store)?;
    assert_eq!(sync.visible_name(), Some("c"));
    assert!(!sync.panel("a").unwrap().is_active());

    store.refresh("b", grid(10))?;
    sync.sync(&mut store)?;
    assert_eq!(sync.navigator().names(), vec!["a", "b", "c"]);
    assert_eq!(sync.navigator().rows()[1].rows, 10);
    assert_eq!(sync.visible_name(), Some("c"));

    store.remove("c")?;
    sync.sync(&mut store)?;
    assert_eq!(sync.visible_name(), Some("b"));
    assert!(sync.is_consistent_with(&store));

    store.remove_many(&["a", "b"])?;
    sync.sync(&mut store)?;
    assert!(sync.visible_panel().is_none());
    assert_eq!(sync.panel_count(), 0);
    assert_eq!(sync.state(), SyncState::Idle);
    Ok(())
}

#[test]
fn test_removing_first_selected_shows_empty_state() -> Result<()> {
    let (mut store, mut sync) = setup();
    store.add_many(
        vec![(Some("a".into()), grid(1)), (Some("b".into()), grid(1))],
        &CallerScope::new(),
    );
    sync.sync(&mut store)?;

    store.remove("a")?;
    sync.sync(&mut store)?;

    assert_eq!(sync.visible_name(), None);
    assert!(!sync.panel("b").unwrap().is_active());
    assert_eq!(sync.navigator().names(), vec!["b"]);
    assert!(sync.is_consistent_with(&store));
    Ok(())
}

#[test]
fn test_paste_flows_back_through_the_store() -> Result<()> {
    let (mut store, mut sync) = setup();
    store.add(grid(3), Some("t"), &CallerScope::new());
    sync.sync(&mut store)?;

    let mut clipboard = MemoryClipboard::new();
    {
        let panel = sync.visible_panel_mut().unwrap();
        panel.move_cursor(1, 1);
        panel.copy_selection(&mut clipboard, false)?;
        panel.move_cursor(1, 0);
    }
    assert_eq!(clipboard.contents(), Some("name_1"));

    let edits = sync.visible_panel().unwrap().paste(&mut clipboard)?;
    store.apply_cell_edits("t", &edits)?;
    sync.sync(&mut store)?;

    let shown = sync.visible_panel().unwrap().displayed();
    assert_eq!(shown.get_value(2, 1).unwrap().to_string(), "name_1");
    assert_eq!(store.entry("t").unwrap().history().len(), 1);
    Ok(())
}

#[test]
fn test_statistics_mode_is_per_entry() -> Result<()> {
    let (mut store, mut sync) = setup();
    store.add(grid(3), Some("a"), &CallerScope::new());
    store.add(grid(3), Some("b"), &CallerScope::new());
    store.set_view_mode("a", ViewMode::Statistics)?;
    sync.sync(&mut store)?;

    assert_eq!(sync.panel("a").unwrap().active_view_mode(), ViewMode::Statistics);
    assert_eq!(sync.panel("b").unwrap().active_view_mode(), ViewMode::Data);
    Ok(())
}

#[test]
fn test_reconcile_after_events_were_dropped() -> Result<()> {
    let (mut store, mut sync) = setup();
    store.add(grid(1), Some("a"), &CallerScope::new());
    store.add(grid(1), Some("b"), &CallerScope::new());
    store.drain_events();
    assert!(!sync.is_consistent_with(&store));

    sync.reconcile(&mut store);

    assert!(sync.is_consistent_with(&store));
    assert_eq!(sync.visible_name(), Some("a"));
    Ok(())
}
