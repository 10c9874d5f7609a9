//! The arena that owns every group, entry and database.

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use keeptree_core::{
    CustomIconStore, DatabaseId, EntryId, GroupId, InvalidOperation, ModelConfig, TreeError,
    TreeEvent, TreeResult, Uuid,
};

use crate::arena::Arena;
use crate::database::Database;
use crate::entry::Entry;
use crate::group::Group;
use crate::observer::{ObserverId, Observers, TreeObserver};

/// Owner of all nodes of one or more databases.
///
/// Every group and entry lives in an arena slot and is addressed by a
/// generational handle. A slot is reachable from at most one parent slot;
/// parent, database and last-visible-entry links are plain handles that
/// never keep a node alive.
#[derive(Debug, Default)]
pub struct Forest {
    pub(crate) config: ModelConfig,
    pub(crate) groups: Arena<Group>,
    pub(crate) entries: Arena<Entry>,
    pub(crate) databases: Arena<Database>,
    pub(crate) observers: Observers,
}

impl Forest {
    /// Create an empty forest.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    // ==================== Construction ====================

    /// Create a standalone group with no parent and no database.
    pub fn create_group(&mut self, name: impl Into<CompactString>) -> GroupId {
        let (index, generation) = self.groups.insert(Group::new(name.into(), &self.config));
        GroupId::new(index, generation)
    }

    /// Create a detached entry.
    pub fn create_entry(&mut self, title: impl Into<String>) -> EntryId {
        let (index, generation) = self.entries.insert(Entry::new(title.into(), &self.config));
        EntryId::new(index, generation)
    }

    /// Create a database without a root group.
    ///
    /// A root must be registered with [`Forest::attach_as_root`] before the
    /// database can hold anything.
    pub fn new_database(&mut self) -> DatabaseId {
        let (index, generation) = self.databases.insert(Database::default());
        DatabaseId::new(index, generation)
    }

    /// Create a database together with a fresh root group.
    pub fn create_database(&mut self, root_name: impl Into<CompactString>) -> DatabaseId {
        let database = self.new_database();
        let root = self.create_group(root_name);
        let db = self
            .databases
            .get_mut(database.index(), database.generation());
        if let Some(db) = db {
            db.root = Some(root);
        }
        self.set_database_recursive(root, Some(database));
        database
    }

    /// Create a group and append it to `parent`.
    pub fn add_group(
        &mut self,
        parent: GroupId,
        name: impl Into<CompactString>,
    ) -> TreeResult<GroupId> {
        self.group_ref(parent)?;
        let group = self.create_group(name);
        self.set_parent(group, parent, None)?;
        Ok(group)
    }

    /// Create an entry and append it to `group`.
    pub fn add_entry(&mut self, group: GroupId, title: impl Into<String>) -> TreeResult<EntryId> {
        self.group_ref(group)?;
        let entry = self.create_entry(title);
        self.move_entry(entry, group)?;
        Ok(entry)
    }

    // ==================== Lookup ====================

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.index(), id.generation())
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(id.index(), id.generation())
    }

    pub fn database(&self, id: DatabaseId) -> Option<&Database> {
        self.databases.get(id.index(), id.generation())
    }

    /// Number of live groups, attached or not.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of live entries, attached or not.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Root group of a database.
    pub fn root_group(&self, database: DatabaseId) -> TreeResult<GroupId> {
        let db = self.database_ref(database)?;
        db.root.ok_or(TreeError::UnknownDatabase(database))
    }

    /// Database an entry belongs to, through its group.
    pub fn entry_database(&self, entry: EntryId) -> TreeResult<Option<DatabaseId>> {
        let entry = self.entry_ref(entry)?;
        Ok(entry
            .group
            .and_then(|group| self.group(group))
            .and_then(|group| group.database))
    }

    /// Check if `group` is the root of its database.
    pub fn is_root(&self, group: GroupId) -> bool {
        self.group(group)
            .and_then(|g| g.database)
            .and_then(|db| self.database(db))
            .is_some_and(|db| db.root == Some(group))
    }

    /// Check if `ancestor` lies on the parent chain of `group`.
    ///
    /// A group is not its own ancestor.
    pub fn is_ancestor_of(&self, ancestor: GroupId, group: GroupId) -> bool {
        let mut current = self.group(group).and_then(|g| g.parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.group(id).and_then(|g| g.parent);
        }
        false
    }

    /// Groups of the subtree rooted at `group`, in pre-order.
    pub fn groups_recursive(&self, group: GroupId, include_self: bool) -> TreeResult<Vec<GroupId>> {
        self.group_ref(group)?;
        let mut result = Vec::new();
        let mut stack = vec![group];
        while let Some(id) = stack.pop() {
            if id != group || include_self {
                result.push(id);
            }
            if let Some(node) = self.group(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        Ok(result)
    }

    /// Entries of the subtree rooted at `group`, in pre-order.
    ///
    /// A group's own entries come before those of its children.
    pub fn entries_recursive(&self, group: GroupId) -> TreeResult<Vec<EntryId>> {
        let groups = self.groups_recursive(group, true)?;
        Ok(groups
            .into_iter()
            .filter_map(|id| self.group(id))
            .flat_map(|node| node.entries.iter().copied())
            .collect())
    }

    /// Find a group of `database` by uuid.
    pub fn find_group_by_uuid(&self, database: DatabaseId, uuid: Uuid) -> TreeResult<Option<GroupId>> {
        if !self.database_ref(database)?.contains_uuid(&uuid) {
            return Ok(None);
        }
        let root = self.root_group(database)?;
        Ok(self
            .groups_recursive(root, true)?
            .into_iter()
            .find(|id| self.group(*id).is_some_and(|g| g.uuid == uuid)))
    }

    /// Find an entry of `database` by uuid.
    pub fn find_entry_by_uuid(&self, database: DatabaseId, uuid: Uuid) -> TreeResult<Option<EntryId>> {
        if !self.database_ref(database)?.contains_uuid(&uuid) {
            return Ok(None);
        }
        let root = self.root_group(database)?;
        Ok(self
            .entries_recursive(root)?
            .into_iter()
            .find(|id| self.entry(*id).is_some_and(|e| e.uuid == uuid)))
    }

    // ==================== Database Stores ====================

    /// Mutable access to a database's custom icons.
    pub fn custom_icons_mut(&mut self, database: DatabaseId) -> TreeResult<&mut CustomIconStore> {
        Ok(&mut self.database_mut(database)?.custom_icons)
    }

    /// Record a tombstone in a database's deleted-objects store.
    pub fn record_tombstone(
        &mut self,
        database: DatabaseId,
        uuid: Uuid,
        deletion_time: DateTime<Utc>,
    ) -> TreeResult<()> {
        self.database_mut(database)?
            .deleted_objects
            .record(uuid, deletion_time);
        Ok(())
    }

    /// Set the deletion time of a tombstone, even to an earlier time than the
    /// one on record.
    pub fn replace_tombstone(
        &mut self,
        database: DatabaseId,
        uuid: Uuid,
        deletion_time: DateTime<Utc>,
    ) -> TreeResult<()> {
        self.database_mut(database)?
            .deleted_objects
            .replace(uuid, deletion_time);
        Ok(())
    }

    /// Change a group's uuid, keeping uuids unique within its database.
    ///
    /// Returns whether the uuid changed.
    pub fn set_group_uuid(&mut self, group: GroupId, uuid: Uuid) -> TreeResult<bool> {
        let node = self.group_ref(group)?;
        if node.uuid == uuid {
            return Ok(false);
        }
        let old = node.uuid;
        if let Some(database) = node.database {
            self.ensure_uuids_free(database, &[uuid])?;
            self.swap_live_uuid(database, old, uuid)?;
        }
        let touch_access = self.config.touch_access_on_modify;
        let node = self.group_mut(group)?;
        node.uuid = uuid;
        if node.update_timeinfo {
            node.time_info.touch(Utc::now(), touch_access);
        }
        self.emit(TreeEvent::DataChanged { group });
        self.emit(TreeEvent::Modified { group });
        Ok(true)
    }

    /// Change an entry's uuid, keeping uuids unique within its database.
    pub fn set_entry_uuid(&mut self, entry: EntryId, uuid: Uuid) -> TreeResult<bool> {
        let old = self.entry_ref(entry)?.uuid;
        if old == uuid {
            return Ok(false);
        }
        if let Some(database) = self.entry_database(entry)? {
            self.ensure_uuids_free(database, &[uuid])?;
            self.swap_live_uuid(database, old, uuid)?;
        }
        let touch_access = self.config.touch_access_on_modify;
        let node = self.entry_mut(entry)?;
        node.uuid = uuid;
        if node.update_timeinfo {
            node.time_info.touch(Utc::now(), touch_access);
        }
        if let Some(group) = node.group {
            self.emit(TreeEvent::EntryDataChanged { group, entry });
            self.emit(TreeEvent::Modified { group });
        }
        Ok(true)
    }

    // ==================== Observers ====================

    /// Register an observer for every event this forest publishes.
    pub fn subscribe(&mut self, observer: impl TreeObserver + 'static) -> ObserverId {
        self.observers.subscribe(Box::new(observer))
    }

    /// Remove an observer. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    // ==================== Internal Helpers ====================

    pub(crate) fn emit(&mut self, event: TreeEvent) {
        self.observers.notify(&event);
    }

    pub(crate) fn group_ref(&self, id: GroupId) -> TreeResult<&Group> {
        self.group(id).ok_or(TreeError::UnknownGroup(id))
    }

    pub(crate) fn group_mut(&mut self, id: GroupId) -> TreeResult<&mut Group> {
        self.groups
            .get_mut(id.index(), id.generation())
            .ok_or(TreeError::UnknownGroup(id))
    }

    pub(crate) fn entry_ref(&self, id: EntryId) -> TreeResult<&Entry> {
        self.entry(id).ok_or(TreeError::UnknownEntry(id))
    }

    pub(crate) fn entry_mut(&mut self, id: EntryId) -> TreeResult<&mut Entry> {
        self.entries
            .get_mut(id.index(), id.generation())
            .ok_or(TreeError::UnknownEntry(id))
    }

    pub(crate) fn database_ref(&self, id: DatabaseId) -> TreeResult<&Database> {
        self.database(id).ok_or(TreeError::UnknownDatabase(id))
    }

    pub(crate) fn database_mut(&mut self, id: DatabaseId) -> TreeResult<&mut Database> {
        self.databases
            .get_mut(id.index(), id.generation())
            .ok_or(TreeError::UnknownDatabase(id))
    }

    /// Set the database link of `group` and every group below it.
    ///
    /// The subtree's uuids move into the new database's index, and any
    /// tombstones the new database holds for them are dropped.
    pub(crate) fn set_database_recursive(&mut self, group: GroupId, database: Option<DatabaseId>) {
        let Self {
            groups,
            entries,
            databases,
            ..
        } = self;
        let mut stack = vec![group];
        while let Some(id) = stack.pop() {
            let Some(node) = groups.get_mut(id.index(), id.generation()) else {
                continue;
            };
            let previous = std::mem::replace(&mut node.database, database);
            stack.extend(node.children.iter().copied());
            if previous == database {
                continue;
            }
            let uuids: Vec<Uuid> = std::iter::once(node.uuid)
                .chain(
                    node.entries
                        .iter()
                        .filter_map(|e| entries.get(e.index(), e.generation()))
                        .map(|e| e.uuid),
                )
                .collect();
            if let Some(old) = previous.and_then(|d| databases.get_mut(d.index(), d.generation())) {
                for uuid in &uuids {
                    old.live_uuids.remove(uuid);
                }
            }
            if let Some(new) = database.and_then(|d| databases.get_mut(d.index(), d.generation())) {
                for uuid in &uuids {
                    new.deleted_objects.remove(uuid);
                }
                new.live_uuids.extend(uuids);
            }
        }
    }

    /// Replace `old` by `new` in a database's uuid index.
    pub(crate) fn swap_live_uuid(&mut self, database: DatabaseId, old: Uuid, new: Uuid) -> TreeResult<()> {
        let live = &mut self.database_mut(database)?.live_uuids;
        live.remove(&old);
        live.insert(new);
        Ok(())
    }

    /// Fail if any of `uuids` already names a group or entry of `database`.
    pub(crate) fn ensure_uuids_free(&self, database: DatabaseId, uuids: &[Uuid]) -> TreeResult<()> {
        let live = &self.database_ref(database)?.live_uuids;
        match uuids.iter().find(|uuid| live.contains(uuid)) {
            Some(uuid) => Err(InvalidOperation::DuplicateUuid {
                uuid: *uuid,
                database,
            }
            .into()),
            None => Ok(()),
        }
    }
}
