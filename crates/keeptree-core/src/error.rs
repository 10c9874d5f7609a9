//! Error types for tree operations.

use thiserror::Error;

use crate::id::{DatabaseId, EntryId, GroupId, Uuid};

/// Errors returned by tree mutations and lookups.
///
/// A failed operation leaves the tree unchanged and emits no events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The requested change would break a tree invariant.
    #[error("Invalid tree operation: {0}")]
    InvalidTreeOperation(#[from] InvalidOperation),

    /// The group handle is stale or was never issued.
    #[error("Unknown group: {0}")]
    UnknownGroup(GroupId),

    /// The entry handle is stale or was never issued.
    #[error("Unknown entry: {0}")]
    UnknownEntry(EntryId),

    /// The database handle is stale or was never issued.
    #[error("Unknown database: {0}")]
    UnknownDatabase(DatabaseId),
}

impl TreeError {
    /// Check if this error is an [`InvalidOperation`].
    pub fn is_invalid_tree_operation(&self) -> bool {
        matches!(self, Self::InvalidTreeOperation(_))
    }
}

/// Reasons a structural change is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidOperation {
    /// A group cannot be its own parent.
    #[error("group {group} cannot be its own parent")]
    SelfParent { group: GroupId },

    /// The new parent lies inside the subtree being moved.
    #[error("group {group} is an ancestor of {target}")]
    Cycle { group: GroupId, target: GroupId },

    /// Database roots stay where they are.
    #[error("group {group} is the root of its database")]
    RootGroup { group: GroupId },

    /// The database already has a root group.
    #[error("database {database} already has a root group")]
    RootAlreadySet { database: DatabaseId },

    /// Only detached groups can become a database root.
    #[error("group {group} is still attached to a tree")]
    NotDetached { group: GroupId },

    /// The identifier is already used inside the target database.
    #[error("uuid {uuid} is already used in database {database}")]
    DuplicateUuid { uuid: Uuid, database: DatabaseId },
}
