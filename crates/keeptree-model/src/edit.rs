//! Field setters for groups and entries.
//!
//! Every setter compares before writing: an unchanged value is a no-op that
//! publishes nothing, a new value is stored, touches the modification time
//! (unless the node's timeinfo updates are off) and publishes exactly one
//! data-changed event followed by `Modified`.

use chrono::Utc;
use compact_str::CompactString;
use keeptree_core::{
    EntryId, GroupId, IconSelector, TimeInfo, TreeError, TreeEvent, TreeResult, TriState,
};

use crate::arena::Arena;
use crate::entry::Entry;
use crate::forest::Forest;
use crate::group::Group;
use crate::observer::Observers;

/// Store `value` in `slot` if it differs. Returns whether it changed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Mutable view on one group's fields.
pub struct GroupEditor<'a> {
    id: GroupId,
    group: &'a mut Group,
    entries: &'a Arena<Entry>,
    observers: &'a mut Observers,
    touch_access: bool,
}

impl Forest {
    /// Start editing a group's fields.
    pub fn edit_group(&mut self, id: GroupId) -> TreeResult<GroupEditor<'_>> {
        let Forest {
            config,
            groups,
            entries,
            observers,
            ..
        } = self;
        let group = groups
            .get_mut(id.index(), id.generation())
            .ok_or(TreeError::UnknownGroup(id))?;
        Ok(GroupEditor {
            id,
            group,
            entries,
            observers,
            touch_access: config.touch_access_on_modify,
        })
    }

    /// Start editing an entry's fields.
    pub fn edit_entry(&mut self, id: EntryId) -> TreeResult<EntryEditor<'_>> {
        let Forest {
            config,
            entries,
            observers,
            ..
        } = self;
        let entry = entries
            .get_mut(id.index(), id.generation())
            .ok_or(TreeError::UnknownEntry(id))?;
        Ok(EntryEditor {
            id,
            entry,
            observers,
            touch_access: config.touch_access_on_modify,
        })
    }
}

impl GroupEditor<'_> {
    /// The group being edited.
    pub fn group(&self) -> &Group {
        self.group
    }

    pub fn set_name(&mut self, name: impl Into<CompactString>) -> bool {
        let changed = replace(&mut self.group.name, name.into());
        self.finish(changed)
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> bool {
        let changed = replace(&mut self.group.notes, notes.into());
        self.finish(changed)
    }

    /// Select a built-in or custom icon.
    ///
    /// A nil custom uuid is ignored.
    pub fn set_icon(&mut self, icon: IconSelector) -> bool {
        if icon.custom_uuid().is_some_and(|uuid| uuid.is_nil()) {
            return false;
        }
        let changed = replace(&mut self.group.icon, icon);
        self.finish(changed)
    }

    pub fn set_expanded(&mut self, expanded: bool) -> bool {
        let changed = replace(&mut self.group.expanded, expanded);
        self.finish(changed)
    }

    pub fn set_default_autotype_sequence(&mut self, sequence: impl Into<String>) -> bool {
        let changed = replace(&mut self.group.default_autotype_sequence, sequence.into());
        self.finish(changed)
    }

    pub fn set_autotype_enabled(&mut self, enabled: TriState) -> bool {
        let changed = replace(&mut self.group.autotype_enabled, enabled);
        self.finish(changed)
    }

    pub fn set_searching_enabled(&mut self, enabled: TriState) -> bool {
        let changed = replace(&mut self.group.searching_enabled, enabled);
        self.finish(changed)
    }

    /// Remember the entry shown at the top of the list.
    ///
    /// A handle to a deleted entry is stored as `None`.
    pub fn set_last_top_visible_entry(&mut self, entry: Option<EntryId>) -> bool {
        let entry = entry.filter(|id| self.entries.get(id.index(), id.generation()).is_some());
        let changed = replace(&mut self.group.last_top_visible_entry, entry);
        self.finish(changed)
    }

    /// Replace the time info wholesale, without notification.
    pub fn set_time_info(&mut self, time_info: TimeInfo) {
        self.group.time_info = time_info;
    }

    /// Turn timestamp updates on field changes on or off.
    pub fn set_update_timeinfo(&mut self, update: bool) {
        self.group.update_timeinfo = update;
    }

    fn finish(&mut self, changed: bool) -> bool {
        if changed {
            if self.group.update_timeinfo {
                self.group.time_info.touch(Utc::now(), self.touch_access);
            }
            self.observers
                .notify(&TreeEvent::DataChanged { group: self.id });
            self.observers.notify(&TreeEvent::Modified { group: self.id });
        }
        changed
    }
}

/// Mutable view on one entry's fields.
///
/// Changes are re-published by the owning group as `EntryDataChanged`; a
/// detached entry changes silently.
pub struct EntryEditor<'a> {
    id: EntryId,
    entry: &'a mut Entry,
    observers: &'a mut Observers,
    touch_access: bool,
}

impl EntryEditor<'_> {
    /// The entry being edited.
    pub fn entry(&self) -> &Entry {
        self.entry
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> bool {
        let changed = replace(&mut self.entry.title, title.into());
        self.finish(changed)
    }

    pub fn set_username(&mut self, username: impl Into<String>) -> bool {
        let changed = replace(&mut self.entry.username, username.into());
        self.finish(changed)
    }

    pub fn set_url(&mut self, url: impl Into<String>) -> bool {
        let changed = replace(&mut self.entry.url, url.into());
        self.finish(changed)
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> bool {
        let changed = replace(&mut self.entry.notes, notes.into());
        self.finish(changed)
    }

    pub fn set_icon(&mut self, icon: IconSelector) -> bool {
        if icon.custom_uuid().is_some_and(|uuid| uuid.is_nil()) {
            return false;
        }
        let changed = replace(&mut self.entry.icon, icon);
        self.finish(changed)
    }

    /// Replace the time info wholesale, without notification.
    pub fn set_time_info(&mut self, time_info: TimeInfo) {
        self.entry.time_info = time_info;
    }

    pub fn set_update_timeinfo(&mut self, update: bool) {
        self.entry.update_timeinfo = update;
    }

    fn finish(&mut self, changed: bool) -> bool {
        if changed {
            if self.entry.update_timeinfo {
                self.entry.time_info.touch(Utc::now(), self.touch_access);
            }
            if let Some(group) = self.entry.group {
                self.observers.notify(&TreeEvent::EntryDataChanged {
                    group,
                    entry: self.id,
                });
                self.observers.notify(&TreeEvent::Modified { group });
            }
        }
        changed
    }
}
