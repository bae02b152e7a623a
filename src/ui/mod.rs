//! User interface layer
//!
//! The terminal viewer, its panels, the static action table and rendering.

pub mod actions;
pub mod render;
pub mod table_panel;
pub mod viewer;

pub use table_panel::{TablePanel, TablePanelFactory};
pub use viewer::Viewer;
