//! View-side state: store events, the navigator, panels and the
//! synchronizer that binds them to the store.

pub mod events;
pub mod navigator;
pub mod panel;
pub mod synchronizer;

pub use events::StoreEvent;
pub use navigator::{Navigator, NavigatorRow};
pub use panel::{MountedPanel, Panel, PanelFactory};
pub use synchronizer::{SyncState, ViewSynchronizer};
