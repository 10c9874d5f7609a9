//! Whole-database operations for keeptree.
//!
//! This crate builds on the group tree model with operations that span a
//! database: JSON layout import and export, path lookups, and replaying
//! tombstones from one copy of a database onto another.

mod layout;
mod reconcile;

pub use layout::{
    DatabaseLayout, EntryLayout, GroupLayout, LayoutError, export, export_group,
    find_group_by_path, group_path, import,
};
pub use reconcile::{
    KeepLive, LastWriterWins, MergePolicy, ReconcileOptions, ReconcileOptionsBuilder,
    ReconcileReport, reconcile,
};
