//! Change notifications published by the group tree.
//!
//! Structural changes are bracketed: the `AboutTo*` event is delivered
//! before any state changes and the matching post event after the change is
//! complete. Every successful mutation ends with a [`TreeEvent::Modified`].

use serde::{Deserialize, Serialize};

use crate::id::{EntryId, GroupId};

/// An event emitted by a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeEvent {
    // ==================== Group Events ====================
    /// A field of the group changed.
    DataChanged { group: GroupId },

    /// The group is about to be inserted under `parent` at `index`.
    AboutToAdd {
        group: GroupId,
        parent: GroupId,
        index: usize,
    },

    /// The group was inserted under `parent`.
    Added { group: GroupId, parent: GroupId },

    /// The group is about to be taken out of `parent`.
    AboutToRemove { group: GroupId, parent: GroupId },

    /// The group was taken out of `parent`.
    Removed { group: GroupId, parent: GroupId },

    /// The group is about to move to `to` at `index` within its database.
    AboutToMove {
        group: GroupId,
        to: GroupId,
        index: usize,
    },

    /// The group moved to `to`.
    Moved { group: GroupId, to: GroupId },

    // ==================== Entry Events ====================
    /// `entry` is about to be appended to `group`.
    EntryAboutToAdd { group: GroupId, entry: EntryId },

    /// `entry` was added to `group`.
    EntryAdded { group: GroupId, entry: EntryId },

    /// `entry` is about to be taken out of `group`.
    EntryAboutToRemove { group: GroupId, entry: EntryId },

    /// `entry` was taken out of `group`.
    EntryRemoved { group: GroupId, entry: EntryId },

    /// A field of `entry` changed; re-published by its owning `group`.
    EntryDataChanged { group: GroupId, entry: EntryId },

    // ==================== Database Events ====================
    /// Something under `group` changed.
    Modified { group: GroupId },
}

impl TreeEvent {
    /// The group that published this event.
    pub fn group(&self) -> GroupId {
        match self {
            Self::DataChanged { group }
            | Self::AboutToAdd { group, .. }
            | Self::Added { group, .. }
            | Self::AboutToRemove { group, .. }
            | Self::Removed { group, .. }
            | Self::AboutToMove { group, .. }
            | Self::Moved { group, .. }
            | Self::EntryAboutToAdd { group, .. }
            | Self::EntryAdded { group, .. }
            | Self::EntryAboutToRemove { group, .. }
            | Self::EntryRemoved { group, .. }
            | Self::EntryDataChanged { group, .. }
            | Self::Modified { group } => *group,
        }
    }

    /// Check if this event is delivered before its change is applied.
    pub fn is_pre_event(&self) -> bool {
        matches!(
            self,
            Self::AboutToAdd { .. }
                | Self::AboutToRemove { .. }
                | Self::AboutToMove { .. }
                | Self::EntryAboutToAdd { .. }
                | Self::EntryAboutToRemove { .. }
        )
    }

    /// Get the event name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DataChanged { .. } => "data_changed",
            Self::AboutToAdd { .. } => "about_to_add",
            Self::Added { .. } => "added",
            Self::AboutToRemove { .. } => "about_to_remove",
            Self::Removed { .. } => "removed",
            Self::AboutToMove { .. } => "about_to_move",
            Self::Moved { .. } => "moved",
            Self::EntryAboutToAdd { .. } => "entry_about_to_add",
            Self::EntryAdded { .. } => "entry_added",
            Self::EntryAboutToRemove { .. } => "entry_about_to_remove",
            Self::EntryRemoved { .. } => "entry_removed",
            Self::EntryDataChanged { .. } => "entry_data_changed",
            Self::Modified { .. } => "modified",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_match_serde_tag() {
        let event = TreeEvent::AboutToMove {
            group: GroupId::new(1, 0),
            to: GroupId::new(2, 0),
            index: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.name());
        assert!(event.is_pre_event());
        assert_eq!(event.group(), GroupId::new(1, 0));
    }

    #[test]
    fn test_post_events() {
        let event = TreeEvent::EntryAdded {
            group: GroupId::new(0, 0),
            entry: EntryId::new(4, 0),
        };
        assert!(!event.is_pre_event());
        assert_eq!(event.name(), "entry_added");
    }
}
