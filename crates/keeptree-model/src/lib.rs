//! Group tree model for keeptree.
//!
//! This crate provides the in-memory model of a credential store: a
//! [`Forest`] arena owning databases, their group trees and entries, with
//! reparenting, inherited policy flags, recursive search, icon resolution
//! and synchronous change notification.
//!
//! ```rust
//! use keeptree_core::{CaseSensitivity, TriState};
//! use keeptree_model::{EventRecorder, Forest};
//!
//! let mut forest = Forest::default();
//! let db = forest.create_database("Root");
//! let root = forest.root_group(db).unwrap();
//! let private = forest.add_group(root, "Private").unwrap();
//! forest.add_entry(private, "abc-secret").unwrap();
//! let other = forest.add_entry(root, "abc-other").unwrap();
//!
//! let recorder = EventRecorder::new();
//! forest.subscribe(recorder.clone());
//! forest
//!     .edit_group(private)
//!     .unwrap()
//!     .set_searching_enabled(TriState::Disable);
//! assert_eq!(recorder.names(), ["data_changed", "modified"]);
//!
//! let found = forest
//!     .search(root, "abc", CaseSensitivity::Insensitive, true)
//!     .unwrap();
//! assert_eq!(found, vec![other]);
//! ```

mod arena;
mod database;
mod edit;
mod entry;
mod forest;
mod group;
mod icons;
mod mutate;
mod observer;
mod policy;
mod search;

pub use database::{Database, DeletedObject, DeletedObjects};
pub use edit::{EntryEditor, GroupEditor};
pub use entry::Entry;
pub use forest::Forest;
pub use group::Group;
pub use icons::{IconCache, ResolvedIcon, resolve_icon};
pub use observer::{EventRecorder, ObserverId, TreeObserver};

// Re-export core types
pub use keeptree_core::{
    CaseSensitivity, CustomIcon, CustomIconStore, DatabaseId, EntryId, GroupId, IconSelector,
    InvalidOperation, ModelConfig, TimeInfo, TreeError, TreeEvent, TreeResult, TriState, Uuid,
};
