//! Core types for keeptree.
//!
//! This crate provides the value types shared by the keeptree crates:
//! identifiers, timestamps, policy flags, icon selectors, change events,
//! errors and configuration.

mod config;
mod error;
mod event;
mod icon;
mod id;
mod policy;
mod time;

pub use config::{ModelConfig, ModelConfigBuilder};
pub use error::{InvalidOperation, TreeError};
pub use event::TreeEvent;
pub use icon::{
    BUILTIN_ICON_COUNT, CustomIcon, CustomIconStore, DEFAULT_ENTRY_ICON, DEFAULT_GROUP_ICON,
    IconSelector,
};
pub use id::{DatabaseId, EntryId, GroupId, Uuid};
pub use policy::{CaseSensitivity, TriState};
pub use time::TimeInfo;

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
