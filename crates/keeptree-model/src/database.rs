//! Database records and deletion tombstones.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use keeptree_core::{CustomIconStore, GroupId, Uuid};
use serde::{Deserialize, Serialize};

/// A tombstone: the identifier of a deleted object and when it was deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedObject {
    pub uuid: Uuid,
    pub deletion_time: DateTime<Utc>,
}

/// Tombstones of one database, one per identifier, in recording order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeletedObjects {
    records: IndexMap<Uuid, DateTime<Utc>>,
}

impl DeletedObjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deletion.
    ///
    /// Recording the same identifier again keeps the later timestamp.
    pub fn record(&mut self, uuid: Uuid, deletion_time: DateTime<Utc>) {
        self.records
            .entry(uuid)
            .and_modify(|existing| *existing = (*existing).max(deletion_time))
            .or_insert(deletion_time);
    }

    /// Set the deletion time of an identifier, even if it is earlier than
    /// the one on record.
    pub fn replace(&mut self, uuid: Uuid, deletion_time: DateTime<Utc>) {
        self.records.insert(uuid, deletion_time);
    }

    /// Deletion time of an identifier, if it was deleted.
    pub fn get(&self, uuid: &Uuid) -> Option<DateTime<Utc>> {
        self.records.get(uuid).copied()
    }

    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.records.contains_key(uuid)
    }

    /// Forget a tombstone, e.g. after the object was restored.
    pub fn remove(&mut self, uuid: &Uuid) -> Option<DateTime<Utc>> {
        self.records.shift_remove(uuid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over tombstones in recording order.
    pub fn iter(&self) -> impl Iterator<Item = DeletedObject> + '_ {
        self.records
            .iter()
            .map(|(uuid, deletion_time)| DeletedObject {
                uuid: *uuid,
                deletion_time: *deletion_time,
            })
    }
}

/// A database: the owner of one root group plus database-wide stores.
#[derive(Debug, Clone, Default)]
pub struct Database {
    pub(crate) root: Option<GroupId>,
    pub(crate) custom_icons: CustomIconStore,
    pub(crate) deleted_objects: DeletedObjects,
    /// Uuids of every group and entry currently in the tree.
    pub(crate) live_uuids: HashSet<Uuid>,
}

impl Database {
    /// The root group, once one was attached.
    pub fn root(&self) -> Option<GroupId> {
        self.root
    }

    pub fn custom_icons(&self) -> &CustomIconStore {
        &self.custom_icons
    }

    pub fn deleted_objects(&self) -> &DeletedObjects {
        &self.deleted_objects
    }

    /// Check if a live group or entry of this database has `uuid`.
    pub fn contains_uuid(&self, uuid: &Uuid) -> bool {
        self.live_uuids.contains(uuid)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_record_keeps_latest() {
        let mut deleted = DeletedObjects::new();
        let uuid = Uuid::random();
        let now = Utc::now();

        deleted.record(uuid, now);
        deleted.record(uuid, now - Duration::seconds(10));
        assert_eq!(deleted.get(&uuid), Some(now));

        deleted.record(uuid, now + Duration::seconds(10));
        assert_eq!(deleted.get(&uuid), Some(now + Duration::seconds(10)));
        assert_eq!(deleted.len(), 1);
    }

    #[test]
    fn test_replace_can_move_time_back() {
        let mut deleted = DeletedObjects::new();
        let uuid = Uuid::random();
        let now = Utc::now();

        deleted.record(uuid, now);
        deleted.replace(uuid, now - Duration::days(3));
        assert_eq!(deleted.get(&uuid), Some(now - Duration::days(3)));
        assert_eq!(deleted.len(), 1);
    }

    #[test]
    fn test_iter_in_recording_order() {
        let mut deleted = DeletedObjects::new();
        let first = Uuid::random();
        let second = Uuid::random();
        let now = Utc::now();
        deleted.record(first, now);
        deleted.record(second, now);

        let uuids: Vec<_> = deleted.iter().map(|d| d.uuid).collect();
        assert_eq!(uuids, vec![first, second]);

        assert!(deleted.remove(&first).is_some());
        assert!(!deleted.contains(&first));
    }
}
