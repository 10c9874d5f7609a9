//! Tombstone reconciliation between two databases.
//!
//! Deletions made in one copy of a database are replayed onto another copy:
//! each tombstone of the source is matched against the live objects of the
//! target and a [`MergePolicy`] decides whether the deletion or the live
//! object wins.

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use keeptree_model::{DatabaseId, DeletedObject, Forest, GroupId, TreeResult, Uuid};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Decides between a tombstone and a live object with the same uuid.
pub trait MergePolicy {
    /// Whether `tombstone` should delete an object last modified at
    /// `last_modified`.
    fn deletion_wins(&self, tombstone: &DeletedObject, last_modified: DateTime<Utc>) -> bool;

    /// Policy name for reports and logs.
    fn name(&self) -> &'static str;
}

/// The later of deletion and modification wins; ties go to the deletion.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastWriterWins;

impl MergePolicy for LastWriterWins {
    fn deletion_wins(&self, tombstone: &DeletedObject, last_modified: DateTime<Utc>) -> bool {
        tombstone.deletion_time >= last_modified
    }

    fn name(&self) -> &'static str {
        "last_writer_wins"
    }
}

/// Never delete live objects; only merge tombstone records.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepLive;

impl MergePolicy for KeepLive {
    fn deletion_wins(&self, _tombstone: &DeletedObject, _last_modified: DateTime<Utc>) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "keep_live"
    }
}

/// Options for [`reconcile`].
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct ReconcileOptions {
    /// Compute the report without changing the target.
    #[serde(default)]
    #[builder(default)]
    pub dry_run: bool,

    /// Copy tombstones for objects the target never had.
    #[serde(default = "default_true")]
    #[builder(default = "true")]
    pub import_tombstones: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            import_tombstones: true,
        }
    }
}

impl ReconcileOptions {
    /// Create a new options builder.
    pub fn builder() -> ReconcileOptionsBuilder {
        ReconcileOptionsBuilder::default()
    }
}

/// What a reconciliation did (or would do, for a dry run).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Policy used.
    pub policy: String,
    /// Entries deleted in the target.
    pub deleted_entries: Vec<Uuid>,
    /// Groups deleted in the target, with their subtrees.
    pub deleted_groups: Vec<Uuid>,
    /// Live objects that outlived a tombstone.
    pub kept: Vec<Uuid>,
    /// Tombstones copied into the target for objects it does not have.
    pub tombstones_imported: usize,
}

impl ReconcileReport {
    /// Check if the target was (or would be) left unchanged.
    pub fn is_noop(&self) -> bool {
        self.deleted_entries.is_empty()
            && self.deleted_groups.is_empty()
            && self.tombstones_imported == 0
    }
}

/// Replay the tombstones of `source` onto `target`.
///
/// Entries are handled before groups. A group yields to its tombstone only
/// if the policy prefers the deletion over the newest modification in the
/// group's whole subtree; the target's root group is never deleted.
/// Tombstones left in the target by a deletion carry the source's deletion
/// time, not the time of the merge.
pub fn reconcile(
    forest: &mut Forest,
    target: DatabaseId,
    source: DatabaseId,
    policy: &dyn MergePolicy,
    options: &ReconcileOptions,
) -> TreeResult<ReconcileReport> {
    let source_deleted = forest
        .database(source)
        .ok_or(keeptree_model::TreeError::UnknownDatabase(source))?
        .deleted_objects()
        .clone();
    let tombstones: Vec<DeletedObject> = source_deleted.iter().collect();
    let target_root = forest.root_group(target)?;
    let mut report = ReconcileReport {
        policy: policy.name().to_string(),
        ..ReconcileReport::default()
    };

    let mut pending_groups = Vec::new();
    let mut absent = Vec::new();
    for tombstone in &tombstones {
        if let Some(entry) = forest.find_entry_by_uuid(target, tombstone.uuid)? {
            let last_modified = forest
                .entry(entry)
                .map(|e| e.time_info().last_modified)
                .unwrap_or(tombstone.deletion_time);
            if policy.deletion_wins(tombstone, last_modified) {
                if !options.dry_run {
                    forest.delete_entry(entry)?;
                    forest.replace_tombstone(target, tombstone.uuid, tombstone.deletion_time)?;
                }
                report.deleted_entries.push(tombstone.uuid);
            } else {
                report.kept.push(tombstone.uuid);
            }
        } else if let Some(group) = forest.find_group_by_uuid(target, tombstone.uuid)? {
            pending_groups.push((group, *tombstone));
        } else {
            absent.push(*tombstone);
        }
    }

    for (group, tombstone) in pending_groups {
        // An earlier deletion may already have taken this group with it.
        if forest.group(group).is_none() {
            report.deleted_groups.push(tombstone.uuid);
            continue;
        }
        if group == target_root {
            report.kept.push(tombstone.uuid);
            continue;
        }
        let newest = newest_modification(forest, group)?;
        if policy.deletion_wins(&tombstone, newest) {
            if !options.dry_run {
                let uuids = subtree_uuids(forest, group)?;
                forest.delete_group(group)?;
                // Keep the source's deletion times for everything it deleted.
                for uuid in uuids {
                    if let Some(time) = source_deleted.get(&uuid) {
                        forest.replace_tombstone(target, uuid, time)?;
                    }
                }
            }
            report.deleted_groups.push(tombstone.uuid);
        } else {
            report.kept.push(tombstone.uuid);
        }
    }

    if options.import_tombstones {
        let known = forest
            .database(target)
            .ok_or(keeptree_model::TreeError::UnknownDatabase(target))?
            .deleted_objects()
            .clone();
        for tombstone in absent {
            if known.get(&tombstone.uuid) >= Some(tombstone.deletion_time) {
                continue;
            }
            if !options.dry_run {
                forest.record_tombstone(target, tombstone.uuid, tombstone.deletion_time)?;
            }
            report.tombstones_imported += 1;
        }
    }

    debug!(
        policy = policy.name(),
        kept = report.kept.len(),
        dry_run = options.dry_run,
        "reconciled tombstones"
    );
    info!(
        entries = report.deleted_entries.len(),
        groups = report.deleted_groups.len(),
        imported = report.tombstones_imported,
        "reconciliation complete"
    );
    Ok(report)
}

/// Uuids of every group and entry in the subtree.
fn subtree_uuids(forest: &Forest, group: GroupId) -> TreeResult<Vec<Uuid>> {
    let groups = forest
        .groups_recursive(group, true)?
        .into_iter()
        .filter_map(|id| forest.group(id))
        .map(|g| g.uuid());
    let entries = forest
        .entries_recursive(group)?
        .into_iter()
        .filter_map(|id| forest.entry(id))
        .map(|e| e.uuid());
    Ok(groups.chain(entries).collect())
}

/// Newest modification time of any group or entry in the subtree.
fn newest_modification(forest: &Forest, group: GroupId) -> TreeResult<DateTime<Utc>> {
    let groups = forest
        .groups_recursive(group, true)?
        .into_iter()
        .filter_map(|id| forest.group(id))
        .map(|g| g.time_info().last_modified);
    let entries = forest
        .entries_recursive(group)?
        .into_iter()
        .filter_map(|id| forest.entry(id))
        .map(|e| e.time_info().last_modified);
    Ok(groups
        .chain(entries)
        .max()
        .unwrap_or(DateTime::<Utc>::MIN_UTC))
}
