//! The application store and the pieces it is built from

pub mod app_store;
pub mod entry;
pub mod resolver;

pub use app_store::{AppStore, Lookup, StoreSnapshot};
pub use entry::{DatasetEntry, EntrySettings, HistoryItem, ViewMode};
pub use resolver::{resolve, CallerScope, NameOrigin, ResolvedDataset};
