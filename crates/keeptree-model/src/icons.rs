//! Icon resolution and an optional rendered-icon cache.

use std::collections::HashMap;

use keeptree_core::{
    BUILTIN_ICON_COUNT, CustomIcon, CustomIconStore, DatabaseId, EntryId, GroupId, IconSelector,
    TreeResult, Uuid,
};

use crate::forest::Forest;

/// A selector resolved against a database's custom icon store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedIcon<'a> {
    /// Icon from the built-in set.
    Builtin(u32),
    /// Custom icon found in the database.
    Custom { uuid: Uuid, icon: &'a CustomIcon },
}

/// Resolve `selector` against `store`, falling back to `fallback`.
///
/// Out-of-range built-in indices and custom icons missing from the store
/// (or with no store at all) resolve to the fallback built-in icon.
pub fn resolve_icon<'a>(
    selector: IconSelector,
    store: Option<&'a CustomIconStore>,
    fallback: u32,
) -> ResolvedIcon<'a> {
    match selector {
        IconSelector::Builtin(index) if index < BUILTIN_ICON_COUNT => ResolvedIcon::Builtin(index),
        IconSelector::Builtin(_) => ResolvedIcon::Builtin(fallback),
        IconSelector::Custom(uuid) => match store.and_then(|store| store.get(&uuid)) {
            Some(icon) => ResolvedIcon::Custom { uuid, icon },
            None => ResolvedIcon::Builtin(fallback),
        },
    }
}

impl Forest {
    /// The icon a group displays.
    pub fn group_icon(&self, group: GroupId) -> TreeResult<ResolvedIcon<'_>> {
        let node = self.group_ref(group)?;
        Ok(resolve_icon(
            node.icon,
            self.icon_store(node.database),
            self.config.default_group_icon,
        ))
    }

    /// The icon an entry displays.
    pub fn entry_icon(&self, entry: EntryId) -> TreeResult<ResolvedIcon<'_>> {
        let icon = self.entry_ref(entry)?.icon;
        let database = self.entry_database(entry)?;
        Ok(resolve_icon(
            icon,
            self.icon_store(database),
            self.config.default_entry_icon,
        ))
    }

    fn icon_store(&self, database: Option<DatabaseId>) -> Option<&CustomIconStore> {
        database
            .and_then(|db| self.database(db))
            .map(|db| &db.custom_icons)
    }
}

/// Rendered icons of one database, keyed by selector.
///
/// The cache drops everything when the custom icon store's revision
/// changes. Keep one cache per database.
#[derive(Debug)]
pub struct IconCache<T> {
    revision: Option<u64>,
    rendered: HashMap<IconSelector, T>,
}

impl<T> Default for IconCache<T> {
    fn default() -> Self {
        Self {
            revision: None,
            rendered: HashMap::new(),
        }
    }
}

impl<T> IconCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the rendering for `selector`, rendering it on a miss.
    pub fn get_or_render(
        &mut self,
        selector: IconSelector,
        store: &CustomIconStore,
        fallback: u32,
        render: impl FnOnce(ResolvedIcon<'_>) -> T,
    ) -> &T {
        if self.revision != Some(store.revision()) {
            self.rendered.clear();
            self.revision = Some(store.revision());
        }
        self.rendered
            .entry(selector)
            .or_insert_with(|| render(resolve_icon(selector, Some(store), fallback)))
    }

    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }
}
