//! Structural mutations: reparenting, attaching, detaching and deleting.
//!
//! Every operation validates completely before touching the tree, so an
//! error leaves the forest unchanged and publishes nothing.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use keeptree_core::{
    DatabaseId, EntryId, GroupId, IconSelector, InvalidOperation, TreeEvent, TreeResult, Uuid,
};
use tracing::debug;

use crate::forest::Forest;

impl Forest {
    /// Move `group` under `parent` at `index`, or append when `index` is `None`.
    ///
    /// The index is clamped to the destination's child count. A move inside
    /// one database is published as `AboutToMove`/`Moved`; anything else
    /// (attaching a new group, moving between databases) as a removal from
    /// the old parent followed by `AboutToAdd`/`Added`. Leaving a database
    /// records tombstones for the whole subtree there.
    pub fn set_parent(
        &mut self,
        group: GroupId,
        parent: GroupId,
        index: Option<usize>,
    ) -> TreeResult<()> {
        let node = self.group_ref(group)?;
        let destination = self.group_ref(parent)?;
        if group == parent {
            return Err(InvalidOperation::SelfParent { group }.into());
        }
        if self.is_ancestor_of(group, parent) {
            return Err(InvalidOperation::Cycle {
                group,
                target: parent,
            }
            .into());
        }
        if self.is_root(group) {
            return Err(InvalidOperation::RootGroup { group }.into());
        }

        let old_parent = node.parent;
        let old_db = node.database;
        let new_db = destination.database;
        let same_parent = old_parent == Some(parent);
        let max_index = destination.children.len() - usize::from(same_parent);
        let index = index.map_or(max_index, |i| i.min(max_index));

        if same_parent && destination.children.iter().position(|c| *c == group) == Some(index) {
            return Ok(());
        }

        let within_database = old_parent.is_some() && old_db == new_db;
        if !within_database {
            if let Some(database) = new_db.filter(|db| Some(*db) != old_db) {
                let uuids = self.subtree_uuids(group)?;
                self.ensure_uuids_free(database, &uuids)?;
            }
        }

        let now = Utc::now();
        if within_database {
            self.emit(TreeEvent::AboutToMove {
                group,
                to: parent,
                index,
            });
            if let Some(old) = old_parent {
                self.group_mut(old)?.children.retain(|c| *c != group);
            }
            self.group_mut(parent)?.children.insert(index, group);
            self.group_mut(group)?.parent = Some(parent);
        } else {
            if let Some(old) = old_parent {
                self.take_out_of_parent(group, old)?;
            }
            if let Some(database) = old_db.filter(|db| Some(*db) != new_db) {
                self.record_subtree_tombstones(group, database, now)?;
                if let Some(target) = new_db {
                    self.copy_custom_icons(group, database, target)?;
                }
            }
            self.emit(TreeEvent::AboutToAdd {
                group,
                parent,
                index,
            });
            self.group_mut(parent)?.children.insert(index, group);
            self.group_mut(group)?.parent = Some(parent);
            if old_db != new_db {
                self.set_database_recursive(group, new_db);
            }
        }

        let node = self.group_mut(group)?;
        if node.update_timeinfo {
            node.time_info.touch_location(now);
        }
        debug!(%group, %parent, index, within_database, "reparented group");

        self.emit(TreeEvent::Modified { group });
        if within_database {
            self.emit(TreeEvent::Moved { group, to: parent });
        } else {
            self.emit(TreeEvent::Added { group, parent });
        }
        Ok(())
    }

    /// Register a detached group as the root of `database`.
    ///
    /// Each database accepts exactly one root; the group and its subtree
    /// join the database.
    pub fn attach_as_root(&mut self, database: DatabaseId, group: GroupId) -> TreeResult<()> {
        let db = self.database_ref(database)?;
        let node = self.group_ref(group)?;
        if db.root.is_some() {
            return Err(InvalidOperation::RootAlreadySet { database }.into());
        }
        if node.parent.is_some() || node.database.is_some() {
            return Err(InvalidOperation::NotDetached { group }.into());
        }

        self.database_mut(database)?.root = Some(group);
        self.set_database_recursive(group, Some(database));
        debug!(%group, %database, "attached root group");
        Ok(())
    }

    /// Take `group` out of its parent and out of its database.
    ///
    /// The subtree stays alive as a standalone tree and can be attached
    /// again with [`Forest::set_parent`]. Detaching a parentless group is a
    /// no-op; database roots cannot be detached.
    pub fn detach_group(&mut self, group: GroupId) -> TreeResult<()> {
        let node = self.group_ref(group)?;
        if self.is_root(group) {
            return Err(InvalidOperation::RootGroup { group }.into());
        }
        let Some(parent) = node.parent else {
            return Ok(());
        };
        let database = node.database;

        self.take_out_of_parent(group, parent)?;
        if let Some(database) = database {
            self.record_subtree_tombstones(group, database, Utc::now())?;
            self.set_database_recursive(group, None);
        }
        debug!(%group, %parent, "detached group");
        self.emit(TreeEvent::Modified { group: parent });
        Ok(())
    }

    /// Delete `group` with all of its descendants and entries.
    ///
    /// Tombstones are recorded when the group was attached to a database.
    /// Handles to any deleted node go stale.
    pub fn delete_group(&mut self, group: GroupId) -> TreeResult<()> {
        self.detach_group(group)?;
        let groups = self.groups_recursive(group, true)?;
        let mut removed = HashSet::new();
        for id in &groups {
            if let Some(node) = self.groups.remove(id.index(), id.generation()) {
                for entry in node.entries {
                    if self.entries.remove(entry.index(), entry.generation()).is_some() {
                        removed.insert(entry);
                    }
                }
            }
        }
        self.forget_entries(&removed);
        debug!(%group, groups = groups.len(), entries = removed.len(), "deleted group");
        Ok(())
    }

    /// Move `entry` to the end of `group`'s entries.
    ///
    /// This is the only way an entry changes groups. Leaving a database
    /// records a tombstone for the entry there. Moving an entry to its
    /// current group is a no-op.
    pub fn move_entry(&mut self, entry: EntryId, group: GroupId) -> TreeResult<()> {
        let node = self.entry_ref(entry)?;
        let destination = self.group_ref(group)?;
        let old_group = node.group;
        if old_group == Some(group) {
            return Ok(());
        }
        let uuid = node.uuid;
        let new_db = destination.database;
        let old_db = self.entry_database(entry)?;
        if let Some(database) = new_db.filter(|db| Some(*db) != old_db) {
            self.ensure_uuids_free(database, &[uuid])?;
        }

        let now = Utc::now();
        if let Some(old) = old_group {
            self.take_entry_out_of_group(entry, old)?;
            if let Some(database) = old_db.filter(|db| Some(*db) != new_db) {
                let time = self.deletion_time(entry, now)?;
                self.record_tombstone(database, uuid, time)?;
                self.database_mut(database)?.live_uuids.remove(&uuid);
                if let Some(target) = new_db {
                    let icon = self.entry_ref(entry)?.icon;
                    self.copy_icon(icon, database, target)?;
                }
            }
        }
        if let Some(database) = new_db.filter(|db| Some(*db) != old_db) {
            let db = self.database_mut(database)?;
            db.deleted_objects.remove(&uuid);
            db.live_uuids.insert(uuid);
        }

        self.emit(TreeEvent::EntryAboutToAdd { group, entry });
        self.group_mut(group)?.entries.push(entry);
        let node = self.entry_mut(entry)?;
        node.group = Some(group);
        if node.update_timeinfo {
            node.time_info.touch_location(now);
        }
        debug!(%entry, %group, "moved entry");
        self.emit(TreeEvent::EntryAdded { group, entry });
        self.emit(TreeEvent::Modified { group });
        Ok(())
    }

    /// Delete an entry, recording a tombstone if it belonged to a database.
    pub fn delete_entry(&mut self, entry: EntryId) -> TreeResult<()> {
        let node = self.entry_ref(entry)?;
        let uuid = node.uuid;
        let group = node.group;
        let database = self.entry_database(entry)?;

        if let Some(group) = group {
            self.take_entry_out_of_group(entry, group)?;
            if let Some(database) = database {
                let time = self.deletion_time(entry, Utc::now())?;
                self.record_tombstone(database, uuid, time)?;
                self.database_mut(database)?.live_uuids.remove(&uuid);
            }
        }
        self.entries.remove(entry.index(), entry.generation());
        self.forget_entries(&HashSet::from([entry]));
        debug!(%entry, "deleted entry");
        if let Some(group) = group {
            self.emit(TreeEvent::Modified { group });
        }
        Ok(())
    }

    /// Tear down a database and its whole tree without recording tombstones.
    pub fn close_database(&mut self, database: DatabaseId) -> TreeResult<()> {
        let db = self.database_ref(database)?;
        if let Some(root) = db.root {
            let mut removed = HashSet::new();
            for id in self.groups_recursive(root, true)? {
                if let Some(node) = self.groups.remove(id.index(), id.generation()) {
                    for entry in node.entries {
                        self.entries.remove(entry.index(), entry.generation());
                        removed.insert(entry);
                    }
                }
            }
            self.forget_entries(&removed);
        }
        self.databases.remove(database.index(), database.generation());
        debug!(%database, "closed database");
        Ok(())
    }

    // ==================== Internal Helpers ====================

    /// Unlink `group` from `parent`, publishing the removal bracket.
    fn take_out_of_parent(&mut self, group: GroupId, parent: GroupId) -> TreeResult<()> {
        self.emit(TreeEvent::AboutToRemove { group, parent });
        self.group_mut(parent)?.children.retain(|c| *c != group);
        self.group_mut(group)?.parent = None;
        self.emit(TreeEvent::Removed { group, parent });
        Ok(())
    }

    /// Unlink `entry` from `group`, publishing the removal bracket.
    fn take_entry_out_of_group(&mut self, entry: EntryId, group: GroupId) -> TreeResult<()> {
        self.emit(TreeEvent::EntryAboutToRemove { group, entry });
        let node = self.group_mut(group)?;
        node.entries.retain(|e| *e != entry);
        if node.last_top_visible_entry == Some(entry) {
            node.last_top_visible_entry = None;
        }
        self.entry_mut(entry)?.group = None;
        self.emit(TreeEvent::EntryRemoved { group, entry });
        Ok(())
    }

    /// Clear every weak reference to freed entries in one pass.
    fn forget_entries(&mut self, freed: &HashSet<EntryId>) {
        if freed.is_empty() {
            return;
        }
        for group in self.groups.iter_mut() {
            if group
                .last_top_visible_entry
                .is_some_and(|entry| freed.contains(&entry))
            {
                group.last_top_visible_entry = None;
            }
        }
    }

    /// Tombstone every entry and group of the subtree in `database`.
    ///
    /// Entries come before their group and children before their parent.
    /// All records share one timestamp, no earlier than any modification
    /// in the subtree.
    fn record_subtree_tombstones(
        &mut self,
        group: GroupId,
        database: DatabaseId,
        now: DateTime<Utc>,
    ) -> TreeResult<()> {
        let mut records = Vec::new();
        let mut time = now;
        for id in self.groups_recursive(group, true)?.into_iter().rev() {
            let node = self.group_ref(id)?;
            for entry in &node.entries {
                let entry = self.entry_ref(*entry)?;
                records.push(entry.uuid);
                time = time.max(entry.time_info.last_modified);
            }
            records.push(node.uuid);
            time = time.max(node.time_info.last_modified);
        }
        debug!(%group, %database, count = records.len(), "recording tombstones");
        let deleted = &mut self.database_mut(database)?.deleted_objects;
        for uuid in records {
            deleted.record(uuid, time);
        }
        Ok(())
    }

    /// Deletion timestamp no earlier than the entry's last modification.
    fn deletion_time(&self, entry: EntryId, now: DateTime<Utc>) -> TreeResult<DateTime<Utc>> {
        Ok(now.max(self.entry_ref(entry)?.time_info.last_modified))
    }

    /// Uuids of every group and entry in the subtree.
    fn subtree_uuids(&self, group: GroupId) -> TreeResult<Vec<Uuid>> {
        let mut uuids = Vec::new();
        for id in self.groups_recursive(group, true)? {
            let node = self.group_ref(id)?;
            uuids.push(node.uuid);
            for entry in &node.entries {
                uuids.push(self.entry_ref(*entry)?.uuid);
            }
        }
        Ok(uuids)
    }

    /// Copy custom icons used in the subtree from `from` into `to`.
    fn copy_custom_icons(
        &mut self,
        group: GroupId,
        from: DatabaseId,
        to: DatabaseId,
    ) -> TreeResult<()> {
        let mut icons = Vec::new();
        for id in self.groups_recursive(group, true)? {
            let node = self.group_ref(id)?;
            icons.push(node.icon);
            for entry in &node.entries {
                icons.push(self.entry_ref(*entry)?.icon);
            }
        }
        for icon in icons {
            self.copy_icon(icon, from, to)?;
        }
        Ok(())
    }

    /// Copy one custom icon between databases if the target lacks it.
    fn copy_icon(&mut self, icon: IconSelector, from: DatabaseId, to: DatabaseId) -> TreeResult<()> {
        let Some(uuid) = icon.custom_uuid() else {
            return Ok(());
        };
        if self.database_ref(to)?.custom_icons.contains(&uuid) {
            return Ok(());
        }
        if let Some(data) = self.database_ref(from)?.custom_icons.get(&uuid).cloned() {
            debug!(%uuid, %from, %to, "copying custom icon");
            self.database_mut(to)?.custom_icons.insert(uuid, data);
        }
        Ok(())
    }
}
