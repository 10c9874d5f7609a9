//! Credential entries, modeled as far as the group tree needs them.

use keeptree_core::{CaseSensitivity, GroupId, IconSelector, ModelConfig, TimeInfo, Uuid};

/// A credential record owned by a group.
#[derive(Debug, Clone)]
pub struct Entry {
    pub(crate) uuid: Uuid,
    pub(crate) title: String,
    pub(crate) username: String,
    pub(crate) url: String,
    pub(crate) notes: String,
    pub(crate) icon: IconSelector,
    pub(crate) time_info: TimeInfo,
    pub(crate) group: Option<GroupId>,
    pub(crate) update_timeinfo: bool,
}

impl Entry {
    pub(crate) fn new(title: String, config: &ModelConfig) -> Self {
        Self {
            uuid: Uuid::random(),
            title,
            username: String::new(),
            url: String::new(),
            notes: String::new(),
            icon: IconSelector::Builtin(config.default_entry_icon),
            time_info: TimeInfo::now(),
            group: None,
            update_timeinfo: config.update_timeinfo,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn url(&self) -> &str {
        &self.url
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

    /// The owning group, `None` while the entry is detached.
    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    /// Check whether `term` occurs in any searchable field.
    ///
    /// Searchable fields are title, username, url and notes. An empty term
    /// matches every entry.
    pub fn matches(&self, term: &str, case: CaseSensitivity) -> bool {
        [&self.title, &self.username, &self.url, &self.notes]
            .into_iter()
            .any(|field| case.contains(field, term))
    }
}
