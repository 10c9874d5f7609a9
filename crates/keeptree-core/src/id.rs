//! Identifier types.
//!
//! [`Uuid`] is the persistent identity of groups, entries and custom icons.
//! [`GroupId`], [`EntryId`] and [`DatabaseId`] are arena handles: they are
//! only meaningful inside the forest that issued them and become stale once
//! the referenced slot is freed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque 16-byte identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uuid(uuid::Uuid);

impl Uuid {
    /// The all-zero identifier.
    pub const NIL: Uuid = Uuid(uuid::Uuid::nil());

    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Create an identifier from raw bytes.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(uuid::Uuid::from_bytes(bytes))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Check if this is the all-zero identifier.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Get the identifier as a lowercase hex string without dashes.
    pub fn to_hex(&self) -> String {
        self.0.simple().to_string()
    }

    /// Parse either the hyphenated or the simple hex form.
    pub fn parse(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for Uuid {
    fn default() -> Self {
        Self::NIL
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name {
            index: u32,
            generation: u32,
        }

        impl $name {
            /// Create a handle from a slot index and generation.
            pub fn new(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }

            /// Slot index inside the arena.
            pub fn index(&self) -> usize {
                self.index as usize
            }

            /// Generation of the slot when this handle was issued.
            pub fn generation(&self) -> u32 {
                self.generation
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}v{}"), self.index, self.generation)
            }
        }
    };
}

arena_id!(
    /// Handle to a group slot.
    GroupId,
    "group"
);
arena_id!(
    /// Handle to an entry slot.
    EntryId,
    "entry"
);
arena_id!(
    /// Handle to a database slot.
    DatabaseId,
    "database"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_random_is_not_nil() {
        let a = Uuid::random();
        let b = Uuid::random();
        assert!(!a.is_nil());
        assert_ne!(a, b);
    }

    #[test]
    fn test_uuid_parse_forms() {
        let uuid = Uuid::from_bytes([0xab; 16]);
        assert_eq!(Uuid::parse(&uuid.to_string()), Some(uuid));
        assert_eq!(Uuid::parse(&uuid.to_hex()), Some(uuid));
        assert_eq!(uuid.to_hex().len(), 32);
        assert!(Uuid::parse("not-a-uuid").is_none());
    }

    #[test]
    fn test_arena_id_display() {
        let id = GroupId::new(3, 1);
        assert_eq!(id.index(), 3);
        assert_eq!(id.generation(), 1);
        assert_eq!(id.to_string(), "group#3v1");
        assert_ne!(id, GroupId::new(3, 2));
    }
}
