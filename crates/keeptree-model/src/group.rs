//! Group nodes.

use compact_str::CompactString;
use keeptree_core::{
    DatabaseId, EntryId, GroupId, IconSelector, ModelConfig, TimeInfo, TriState, Uuid,
};

/// A named node of the group tree.
///
/// Groups are owned by a [`crate::Forest`]; structural links (`parent`,
/// `children`, `entries`, `database`) change only through the forest's
/// mutation methods and fields through [`crate::GroupEditor`].
#[derive(Debug, Clone)]
pub struct Group {
    pub(crate) uuid: Uuid,
    pub(crate) name: CompactString,
    pub(crate) notes: String,
    pub(crate) icon: IconSelector,
    pub(crate) time_info: TimeInfo,
    pub(crate) expanded: bool,
    pub(crate) default_autotype_sequence: String,
    pub(crate) autotype_enabled: TriState,
    pub(crate) searching_enabled: TriState,
    pub(crate) last_top_visible_entry: Option<EntryId>,
    pub(crate) children: Vec<GroupId>,
    pub(crate) entries: Vec<EntryId>,
    pub(crate) parent: Option<GroupId>,
    pub(crate) database: Option<DatabaseId>,
    pub(crate) update_timeinfo: bool,
}

impl Group {
    pub(crate) fn new(name: CompactString, config: &ModelConfig) -> Self {
        Self {
            uuid: Uuid::random(),
            name,
            notes: String::new(),
            icon: IconSelector::Builtin(config.default_group_icon),
            time_info: TimeInfo::now(),
            expanded: true,
            default_autotype_sequence: String::new(),
            autotype_enabled: TriState::Inherit,
            searching_enabled: TriState::Inherit,
            last_top_visible_entry: None,
            children: Vec::new(),
            entries: Vec::new(),
            parent: None,
            database: None,
            update_timeinfo: config.update_timeinfo,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn icon(&self) -> IconSelector {
        self.icon
    }

    pub fn time_info(&self) -> &TimeInfo {
        &self.time_info
    }

    /// Whether the group is shown expanded in a tree view.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn default_autotype_sequence(&self) -> &str {
        &self.default_autotype_sequence
    }

    /// The group's own auto-type flag, before inheritance.
    pub fn autotype_enabled(&self) -> TriState {
        self.autotype_enabled
    }

    /// The group's own searching flag, before inheritance.
    pub fn searching_enabled(&self) -> TriState {
        self.searching_enabled
    }

    /// Entry last shown at the top of the entry list, if it still exists.
    pub fn last_top_visible_entry(&self) -> Option<EntryId> {
        self.last_top_visible_entry
    }

    /// Child groups in display order.
    pub fn children(&self) -> &[GroupId] {
        &self.children
    }

    /// Entries in display order.
    pub fn entries(&self) -> &[EntryId] {
        &self.entries
    }

    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    pub fn database(&self) -> Option<DatabaseId> {
        self.database
    }

    /// Whether field changes touch the modification timestamp.
    pub fn updates_timeinfo(&self) -> bool {
        self.update_timeinfo
    }
}
