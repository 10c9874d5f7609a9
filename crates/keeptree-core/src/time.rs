//! Timestamps attached to groups and entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creation, modification, access and expiry times of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInfo {
    /// When the node was created.
    pub created: DateTime<Utc>,
    /// Last change to any of the node's fields.
    pub last_modified: DateTime<Utc>,
    /// Last time the node was read or changed.
    pub last_accessed: DateTime<Utc>,
    /// Expiry time, only meaningful when `expires` is set.
    pub expiry_time: DateTime<Utc>,
    /// Whether the node expires at `expiry_time`.
    pub expires: bool,
    /// Number of times the node has been used.
    #[serde(default)]
    pub usage_count: u32,
    /// Last time the node was moved to another parent.
    pub location_changed: DateTime<Utc>,
}

impl TimeInfo {
    /// Create time info with every timestamp set to `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            created: now,
            last_modified: now,
            last_accessed: now,
            expiry_time: now,
            expires: false,
            usage_count: 0,
            location_changed: now,
        }
    }

    /// Create time info stamped with the current time.
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    /// Mark a modification at `now`, optionally counting it as an access.
    pub fn touch(&mut self, now: DateTime<Utc>, include_access: bool) {
        self.last_modified = now;
        if include_access {
            self.last_accessed = now;
        }
    }

    /// Record a read access.
    pub fn touch_access(&mut self, now: DateTime<Utc>) {
        self.last_accessed = now;
        self.usage_count = self.usage_count.saturating_add(1);
    }

    /// Record a move to another parent.
    pub fn touch_location(&mut self, now: DateTime<Utc>) {
        self.location_changed = now;
    }

    /// Check whether the node is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires && self.expiry_time <= now
    }
}

impl Default for TimeInfo {
    fn default() -> Self {
        Self::now()
    }
}
