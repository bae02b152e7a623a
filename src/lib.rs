pub mod config;
pub mod data;
pub mod error;
pub mod state;
pub mod store;
pub mod ui;
pub mod utils;

use crate::config::Settings;
use crate::data::datatable::SharedTable;
use crate::store::CallerScope;
use crate::ui::Viewer;

pub use crate::error::{Result, ViewerError};

/// Open a viewer on `objects`, naming unnamed ones from `scope`.
///
/// The viewer keeps `scope`; its Refresh action re-reads those bindings.
///
/// With `settings.block` the terminal UI runs until the user closes it;
/// otherwise the viewer is returned straight away. Either way the returned
/// viewer holds the (possibly edited) datasets.
pub fn show(
    objects: Vec<(Option<String>, SharedTable)>,
    scope: &CallerScope,
    settings: Settings,
) -> anyhow::Result<Viewer> {
    let block = settings.block;
    let mut viewer = Viewer::with_system_clipboard(settings);
    viewer.open(objects, scope);
    if block {
        viewer.run_terminal()?;
    }
    Ok(viewer)
}
