//! Icon selectors and the per-database custom icon store.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::Uuid;

/// Number of icons in the built-in icon set.
pub const BUILTIN_ICON_COUNT: u32 = 69;

/// Built-in icon used for new groups (a folder).
pub const DEFAULT_GROUP_ICON: u32 = 48;

/// Built-in icon used for new entries (a key).
pub const DEFAULT_ENTRY_ICON: u32 = 0;

/// Which icon a group or entry displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IconSelector {
    /// Index into the built-in icon set.
    Builtin(u32),
    /// Custom icon stored in the owning database.
    Custom(Uuid),
}

impl IconSelector {
    /// Check if this selector refers to a custom icon.
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// The custom icon uuid, if any.
    pub fn custom_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Custom(uuid) => Some(*uuid),
            Self::Builtin(_) => None,
        }
    }
}

impl Default for IconSelector {
    fn default() -> Self {
        Self::Builtin(DEFAULT_GROUP_ICON)
    }
}

/// Encoded image data of a custom icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomIcon {
    /// Raw image bytes (usually PNG).
    pub data: Vec<u8>,
}

impl CustomIcon {
    /// Create a custom icon from raw image bytes.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

/// Custom icons of one database, keyed by uuid in insertion order.
///
/// Every change bumps [`CustomIconStore::revision`] so caches keyed on the
/// store can tell when they are stale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomIconStore {
    icons: IndexMap<Uuid, CustomIcon>,
    #[serde(skip)]
    revision: u64,
}

impl CustomIconStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an icon.
    pub fn insert(&mut self, uuid: Uuid, icon: CustomIcon) {
        self.icons.insert(uuid, icon);
        self.revision += 1;
    }

    /// Remove an icon, keeping the order of the others.
    pub fn remove(&mut self, uuid: &Uuid) -> Option<CustomIcon> {
        let removed = self.icons.shift_remove(uuid);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    /// Look up an icon.
    pub fn get(&self, uuid: &Uuid) -> Option<&CustomIcon> {
        self.icons.get(uuid)
    }

    /// Check if an icon is present.
    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.icons.contains_key(uuid)
    }

    /// Number of icons in the store.
    pub fn len(&self) -> usize {
        self.icons.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    /// Counter incremented on every change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Iterate over icons in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &CustomIcon)> {
        self.icons.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_revision_tracks_changes() {
        let mut store = CustomIconStore::new();
        let uuid = Uuid::random();
        assert_eq!(store.revision(), 0);

        store.insert(uuid, CustomIcon::new(vec![1, 2, 3]));
        assert_eq!(store.revision(), 1);
        assert!(store.contains(&uuid));

        assert!(store.remove(&Uuid::random()).is_none());
        assert_eq!(store.revision(), 1);

        assert!(store.remove(&uuid).is_some());
        assert_eq!(store.revision(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_selector_custom_uuid() {
        let uuid = Uuid::random();
        assert_eq!(IconSelector::Custom(uuid).custom_uuid(), Some(uuid));
        assert!(IconSelector::default().custom_uuid().is_none());
    }
}
