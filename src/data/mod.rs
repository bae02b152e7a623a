//! Data layer: the table payload and its import/export collaborators
//!
//! The store treats tables as opaque shared payloads; everything that reads
//! or writes their contents lives here.

pub mod cell_search;
pub mod clipboard;
pub mod data_analyzer;
pub mod data_exporter;
pub mod datatable;
pub mod loaders;
