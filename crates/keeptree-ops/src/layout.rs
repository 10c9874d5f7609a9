//! JSON layouts of whole databases.
//!
//! A layout is a plain nested description of a database (groups, entries,
//! custom icons and tombstones) used to seed a [`Forest`] from disk and to
//! snapshot one back. Importing is a bulk load: timestamp updates are off
//! while fields are filled in, and stored time info is applied last.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use keeptree_model::{
    CustomIcon, DatabaseId, DeletedObject, EntryId, Forest, GroupId, IconSelector, TimeInfo,
    TreeError, TreeResult, TriState, Uuid,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors from loading, saving or importing layouts.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid layout: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("no group at path '{0}'")]
    PathNotFound(String),
}

/// A whole database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseLayout {
    pub root: GroupLayout,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub custom_icons: IndexMap<Uuid, CustomIcon>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deleted_objects: Vec<DeletedObject>,
}

/// One group and everything below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupLayout {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconSelector>,

    #[serde(default = "default_expanded")]
    pub expanded: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_autotype_sequence: String,

    #[serde(default)]
    pub autotype: TriState,

    #[serde(default)]
    pub searching: TriState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_info: Option<TimeInfo>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<EntryLayout>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupLayout>,
}

fn default_expanded() -> bool {
    true
}

/// One entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryLayout {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconSelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_info: Option<TimeInfo>,
}

impl GroupLayout {
    /// A group with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uuid: None,
            notes: String::new(),
            icon: None,
            expanded: true,
            default_autotype_sequence: String::new(),
            autotype: TriState::Inherit,
            searching: TriState::Inherit,
            time_info: None,
            entries: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: GroupLayout) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_entry(mut self, entry: EntryLayout) -> Self {
        self.entries.push(entry);
        self
    }
}

impl EntryLayout {
    /// An entry with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

impl DatabaseLayout {
    pub fn new(root: GroupLayout) -> Self {
        Self {
            root,
            custom_icons: IndexMap::new(),
            deleted_objects: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, LayoutError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a layout file.
    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let json = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Write the layout as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), LayoutError> {
        std::fs::write(path, self.to_json_pretty()?).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Build a new database in `forest` from `layout`.
///
/// On failure (for example duplicate uuids) the partially built database
/// is closed again.
pub fn import(forest: &mut Forest, layout: &DatabaseLayout) -> Result<DatabaseId, LayoutError> {
    let database = forest.create_database(layout.root.name.as_str());
    match populate(forest, database, layout) {
        Ok(()) => {
            debug!(%database, groups = forest.group_count(), "imported layout");
            Ok(database)
        }
        Err(err) => {
            forest.close_database(database)?;
            Err(err.into())
        }
    }
}

fn populate(forest: &mut Forest, database: DatabaseId, layout: &DatabaseLayout) -> TreeResult<()> {
    let icons = forest.custom_icons_mut(database)?;
    for (uuid, icon) in &layout.custom_icons {
        icons.insert(*uuid, icon.clone());
    }
    for tombstone in &layout.deleted_objects {
        forest.record_tombstone(database, tombstone.uuid, tombstone.deletion_time)?;
    }
    let root = forest.root_group(database)?;
    fill_group(forest, root, &layout.root)
}

fn fill_group(forest: &mut Forest, group: GroupId, layout: &GroupLayout) -> TreeResult<()> {
    let update = forest.config().update_timeinfo;
    {
        let mut editor = forest.edit_group(group)?;
        editor.set_update_timeinfo(false);
        editor.set_notes(layout.notes.as_str());
        if let Some(icon) = layout.icon {
            editor.set_icon(icon);
        }
        editor.set_expanded(layout.expanded);
        editor.set_default_autotype_sequence(layout.default_autotype_sequence.as_str());
        editor.set_autotype_enabled(layout.autotype);
        editor.set_searching_enabled(layout.searching);
    }
    if let Some(uuid) = layout.uuid {
        forest.set_group_uuid(group, uuid)?;
    }

    for entry in &layout.entries {
        let id = forest.add_entry(group, entry.title.as_str())?;
        fill_entry(forest, id, entry, update)?;
    }
    for child in &layout.groups {
        let id = forest.add_group(group, child.name.as_str())?;
        fill_group(forest, id, child)?;
    }

    let mut editor = forest.edit_group(group)?;
    if let Some(time_info) = layout.time_info {
        editor.set_time_info(time_info);
    }
    editor.set_update_timeinfo(update);
    Ok(())
}

fn fill_entry(
    forest: &mut Forest,
    entry: EntryId,
    layout: &EntryLayout,
    update: bool,
) -> TreeResult<()> {
    forest.edit_entry(entry)?.set_update_timeinfo(false);
    if let Some(uuid) = layout.uuid {
        forest.set_entry_uuid(entry, uuid)?;
    }
    let mut editor = forest.edit_entry(entry)?;
    editor.set_username(layout.username.as_str());
    editor.set_url(layout.url.as_str());
    editor.set_notes(layout.notes.as_str());
    if let Some(icon) = layout.icon {
        editor.set_icon(icon);
    }
    if let Some(time_info) = layout.time_info {
        editor.set_time_info(time_info);
    }
    editor.set_update_timeinfo(update);
    Ok(())
}

/// Snapshot a database as a layout.
pub fn export(forest: &Forest, database: DatabaseId) -> TreeResult<DatabaseLayout> {
    let db = forest
        .database(database)
        .ok_or(TreeError::UnknownDatabase(database))?;
    let root = forest.root_group(database)?;
    Ok(DatabaseLayout {
        root: export_group(forest, root)?,
        custom_icons: db
            .custom_icons()
            .iter()
            .map(|(uuid, icon)| (*uuid, icon.clone()))
            .collect(),
        deleted_objects: db.deleted_objects().iter().collect(),
    })
}

/// Snapshot one group and its subtree.
pub fn export_group(forest: &Forest, group: GroupId) -> TreeResult<GroupLayout> {
    let node = forest.group(group).ok_or(TreeError::UnknownGroup(group))?;
    let entries = node
        .entries()
        .iter()
        .map(|id| {
            let entry = forest.entry(*id).ok_or(TreeError::UnknownEntry(*id))?;
            Ok(EntryLayout {
                title: entry.title().to_string(),
                uuid: Some(entry.uuid()),
                username: entry.username().to_string(),
                url: entry.url().to_string(),
                notes: entry.notes().to_string(),
                icon: Some(entry.icon()),
                time_info: Some(*entry.time_info()),
            })
        })
        .collect::<TreeResult<Vec<_>>>()?;
    let groups = node
        .children()
        .iter()
        .map(|child| export_group(forest, *child))
        .collect::<TreeResult<Vec<_>>>()?;

    Ok(GroupLayout {
        name: node.name().to_string(),
        uuid: Some(node.uuid()),
        notes: node.notes().to_string(),
        icon: Some(node.icon()),
        expanded: node.is_expanded(),
        default_autotype_sequence: node.default_autotype_sequence().to_string(),
        autotype: node.autotype_enabled(),
        searching: node.searching_enabled(),
        time_info: Some(*node.time_info()),
        entries,
        groups,
    })
}

/// Find a group by a slash-separated path of names below the root.
///
/// An empty path (or `/`) names the root itself. Among siblings with the
/// same name the first one wins.
pub fn find_group_by_path(
    forest: &Forest,
    database: DatabaseId,
    path: &str,
) -> Result<GroupId, LayoutError> {
    let mut current = forest.root_group(database)?;
    for name in path.split('/').filter(|part| !part.is_empty()) {
        let node = forest
            .group(current)
            .ok_or(TreeError::UnknownGroup(current))?;
        current = node
            .children()
            .iter()
            .copied()
            .find(|child| forest.group(*child).is_some_and(|g| g.name() == name))
            .ok_or_else(|| LayoutError::PathNotFound(path.to_string()))?;
    }
    Ok(current)
}

/// Slash-separated path of `group` below its topmost ancestor.
pub fn group_path(forest: &Forest, group: GroupId) -> TreeResult<String> {
    let mut names = Vec::new();
    let mut current = forest.group(group).ok_or(TreeError::UnknownGroup(group))?;
    while let Some(parent) = current.parent() {
        names.push(current.name().to_string());
        current = forest.group(parent).ok_or(TreeError::UnknownGroup(parent))?;
    }
    names.reverse();
    Ok(format!("/{}", names.join("/")))
}
