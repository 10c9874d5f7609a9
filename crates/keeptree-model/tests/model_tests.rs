use keeptree_model::{
    CaseSensitivity, CustomIcon, DatabaseId, EntryId, EventRecorder, Forest, GroupId,
    IconSelector, TreeError, TreeEvent, TriState, Uuid,
};

fn forest_with_root() -> (Forest, DatabaseId, GroupId) {
    let mut forest = Forest::default();
    let db = forest.create_database("Root");
    let root = forest.root_group(db).unwrap();
    (forest, db, root)
}

/// Root
/// ├── a
/// │   ├── a1 (entry "a1-entry")
/// │   └── a2
/// └── b (entry "b-entry")
struct Sample {
    forest: Forest,
    db: DatabaseId,
    root: GroupId,
    a: GroupId,
    a1: GroupId,
    a2: GroupId,
    b: GroupId,
    a1_entry: EntryId,
    b_entry: EntryId,
}

fn sample() -> Sample {
    let (mut forest, db, root) = forest_with_root();
    let a = forest.add_group(root, "a").unwrap();
    let a1 = forest.add_group(a, "a1").unwrap();
    let a2 = forest.add_group(a, "a2").unwrap();
    let b = forest.add_group(root, "b").unwrap();
    let a1_entry = forest.add_entry(a1, "a1-entry").unwrap();
    let b_entry = forest.add_entry(b, "b-entry").unwrap();
    Sample {
        forest,
        db,
        root,
        a,
        a1,
        a2,
        b,
        a1_entry,
        b_entry,
    }
}

#[test]
fn test_inherit_everywhere_resolves_to_default() {
    let s = sample();
    for group in s.forest.groups_recursive(s.root, true).unwrap() {
        assert!(s.forest.resolve_autotype_enabled(group).unwrap());
        assert!(s.forest.resolve_searching_enabled(group).unwrap());
    }
}

#[test]
fn test_cycle_rejected_without_events() {
    let mut s = sample();
    let deep = s.forest.add_group(s.a1, "deep").unwrap();
    let recorder = EventRecorder::new();
    s.forest.subscribe(recorder.clone());
    let children_before = s.forest.group(s.a).unwrap().children().to_vec();

    let err = s.forest.set_parent(s.a, s.a1, None).unwrap_err();
    assert!(err.is_invalid_tree_operation());

    let err = s.forest.set_parent(s.a, s.a, Some(0)).unwrap_err();
    assert!(err.is_invalid_tree_operation());

    let err = s.forest.set_parent(s.a, deep, None).unwrap_err();
    assert!(err.is_invalid_tree_operation());
    assert!(s.forest.is_ancestor_of(s.a, deep));

    assert!(recorder.is_empty());
    assert_eq!(s.forest.group(deep).unwrap().parent(), Some(s.a1));
    assert_eq!(s.forest.group(s.a1).unwrap().parent(), Some(s.a));
    assert_eq!(s.forest.group(s.a).unwrap().parent(), Some(s.root));
    assert_eq!(s.forest.group(s.a).unwrap().children(), children_before.as_slice());
}

#[test]
fn test_stale_target_rejected() {
    let mut s = sample();
    s.forest.delete_group(s.a2).unwrap();
    let err = s.forest.set_parent(s.b, s.a2, None).unwrap_err();
    assert_eq!(err, TreeError::UnknownGroup(s.a2));
}

#[test]
fn test_set_parent_postconditions() {
    let mut s = sample();
    s.forest.set_parent(s.a, s.b, Some(0)).unwrap();

    assert_eq!(s.forest.group(s.b).unwrap().children()[0], s.a);
    assert_eq!(s.forest.group(s.a).unwrap().parent(), Some(s.b));
    for group in s.forest.groups_recursive(s.a, true).unwrap() {
        assert_eq!(s.forest.group(group).unwrap().database(), Some(s.db));
    }
    assert_eq!(s.forest.group(s.root).unwrap().children(), &[s.b]);
}

#[test]
fn test_move_within_database_bracket() {
    let mut s = sample();
    let recorder = EventRecorder::new();
    s.forest.subscribe(recorder.clone());

    s.forest.set_parent(s.a2, s.b, None).unwrap();
    assert_eq!(
        recorder.events(),
        vec![
            TreeEvent::AboutToMove {
                group: s.a2,
                to: s.b,
                index: 0
            },
            TreeEvent::Modified { group: s.a2 },
            TreeEvent::Moved {
                group: s.a2,
                to: s.b
            },
        ]
    );
    // Moving inside one database leaves no tombstones.
    let db = s.forest.database(s.db).unwrap();
    assert!(db.deleted_objects().is_empty());
}

#[test]
fn test_pre_event_delivered_first() {
    use std::sync::{Arc, Mutex};

    let mut s = sample();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    s.forest.subscribe(move |event: &TreeEvent| {
        sink.lock().unwrap().push(event.is_pre_event());
    });

    s.forest.set_parent(s.a2, s.b, None).unwrap();
    let flags = seen.lock().unwrap().clone();
    assert_eq!(flags.first(), Some(&true));
    assert!(flags[1..].iter().all(|pre| !pre));
}

#[test]
fn test_attach_new_group_events() {
    let (mut forest, _, root) = forest_with_root();
    let recorder = EventRecorder::new();
    forest.subscribe(recorder.clone());

    let group = forest.create_group("new");
    forest.set_parent(group, root, None).unwrap();
    assert_eq!(recorder.names(), vec!["about_to_add", "modified", "added"]);
}

#[test]
fn test_move_between_databases() {
    let mut s = sample();
    let other_db = s.forest.create_database("Other");
    let other_root = s.forest.root_group(other_db).unwrap();
    let recorder = EventRecorder::new();
    s.forest.subscribe(recorder.clone());

    s.forest.set_parent(s.a, other_root, None).unwrap();

    assert_eq!(
        recorder.names(),
        vec!["about_to_remove", "removed", "about_to_add", "modified", "added"]
    );
    for group in s.forest.groups_recursive(s.a, true).unwrap() {
        assert_eq!(s.forest.group(group).unwrap().database(), Some(other_db));
    }
    assert_eq!(s.forest.entry_database(s.a1_entry).unwrap(), Some(other_db));

    // The source database remembers everything that left it.
    let deleted = s.forest.database(s.db).unwrap().deleted_objects();
    for group in [s.a, s.a1, s.a2] {
        let uuid = s.forest.group(group).unwrap().uuid();
        assert!(deleted.contains(&uuid));
    }
    assert!(deleted.contains(&s.forest.entry(s.a1_entry).unwrap().uuid()));
    assert_eq!(deleted.len(), 4);
}

#[test]
fn test_cross_database_move_rejects_duplicate_uuid() {
    let mut s = sample();
    let other_db = s.forest.create_database("Other");
    let other_root = s.forest.root_group(other_db).unwrap();
    let clash = s.forest.add_group(other_root, "clash").unwrap();
    let a1_uuid = s.forest.group(s.a1).unwrap().uuid();
    s.forest.set_group_uuid(clash, a1_uuid).unwrap();

    let recorder = EventRecorder::new();
    s.forest.subscribe(recorder.clone());
    let err = s.forest.set_parent(s.a, other_root, None).unwrap_err();

    assert!(err.is_invalid_tree_operation());
    assert!(recorder.is_empty());
    assert_eq!(s.forest.group(s.a).unwrap().database(), Some(s.db));
    assert_eq!(s.forest.group(s.a).unwrap().parent(), Some(s.root));
}

#[test]
fn test_cross_database_move_copies_custom_icon() {
    let mut s = sample();
    let icon = Uuid::random();
    s.forest
        .custom_icons_mut(s.db)
        .unwrap()
        .insert(icon, CustomIcon::new(vec![1, 2, 3]));
    s.forest
        .edit_entry(s.a1_entry)
        .unwrap()
        .set_icon(IconSelector::Custom(icon));

    let other_db = s.forest.create_database("Other");
    let other_root = s.forest.root_group(other_db).unwrap();
    s.forest.set_parent(s.a, other_root, None).unwrap();

    let store = s.forest.database(other_db).unwrap().custom_icons();
    assert_eq!(store.get(&icon), Some(&CustomIcon::new(vec![1, 2, 3])));
}

#[test]
fn test_delete_records_recursive_tombstones() {
    let mut s = sample();
    let mut last_modified = Vec::new();
    let mut uuids = Vec::new();
    for group in s.forest.groups_recursive(s.a, true).unwrap() {
        let node = s.forest.group(group).unwrap();
        uuids.push(node.uuid());
        last_modified.push(node.time_info().last_modified);
    }
    let entry = s.forest.entry(s.a1_entry).unwrap();
    uuids.push(entry.uuid());
    last_modified.push(entry.time_info().last_modified);
    let newest = last_modified.into_iter().max().unwrap();

    s.forest.delete_group(s.a).unwrap();

    let deleted = s.forest.database(s.db).unwrap().deleted_objects();
    assert_eq!(deleted.len(), uuids.len());
    for uuid in &uuids {
        assert!(deleted.get(uuid).unwrap() >= newest);
    }
    assert!(s.forest.group(s.a1).is_none());
    assert!(s.forest.entry(s.a1_entry).is_none());
    assert_eq!(s.forest.group(s.root).unwrap().children(), &[s.b]);
}

#[test]
fn test_delete_entry_clears_weak_reference() {
    let mut s = sample();
    s.forest
        .edit_group(s.root)
        .unwrap()
        .set_last_top_visible_entry(Some(s.b_entry));
    assert_eq!(
        s.forest.group(s.root).unwrap().last_top_visible_entry(),
        Some(s.b_entry)
    );

    s.forest.delete_entry(s.b_entry).unwrap();
    assert!(s.forest.group(s.root).unwrap().last_top_visible_entry().is_none());
    let uuid_recorded = s.forest.database(s.db).unwrap().deleted_objects().len();
    assert_eq!(uuid_recorded, 1);
}

#[test]
fn test_delete_group_clears_weak_references() {
    let mut s = sample();
    for group in [s.root, s.a2] {
        s.forest
            .edit_group(group)
            .unwrap()
            .set_last_top_visible_entry(Some(s.a1_entry));
    }
    s.forest
        .edit_group(s.b)
        .unwrap()
        .set_last_top_visible_entry(Some(s.b_entry));

    s.forest.delete_group(s.a).unwrap();

    assert!(s.forest.group(s.root).unwrap().last_top_visible_entry().is_none());
    assert_eq!(
        s.forest.group(s.b).unwrap().last_top_visible_entry(),
        Some(s.b_entry)
    );
}

#[test]
fn test_detach_and_reattach() {
    let mut s = sample();
    s.forest.detach_group(s.a).unwrap();

    assert!(s.forest.group(s.a).unwrap().parent().is_none());
    for group in s.forest.groups_recursive(s.a, true).unwrap() {
        assert!(s.forest.group(group).unwrap().database().is_none());
    }
    assert_eq!(s.forest.entry_database(s.a1_entry).unwrap(), None);

    let deleted = s.forest.database(s.db).unwrap().deleted_objects();
    assert_eq!(deleted.len(), 4);

    s.forest.set_parent(s.a, s.b, None).unwrap();
    assert_eq!(s.forest.group(s.a1).unwrap().database(), Some(s.db));

    // Live again, so no longer deleted.
    let db = s.forest.database(s.db).unwrap();
    for group in [s.a, s.a1, s.a2] {
        let uuid = s.forest.group(group).unwrap().uuid();
        assert!(!db.deleted_objects().contains(&uuid));
        assert!(db.contains_uuid(&uuid));
    }
    assert!(db.deleted_objects().is_empty());
}

#[test]
fn test_entry_returning_to_database_drops_tombstone() {
    let mut s = sample();
    let other_db = s.forest.create_database("Other");
    let other_root = s.forest.root_group(other_db).unwrap();
    let uuid = s.forest.entry(s.b_entry).unwrap().uuid();

    s.forest.move_entry(s.b_entry, other_root).unwrap();
    assert!(s.forest.database(s.db).unwrap().deleted_objects().contains(&uuid));
    assert!(!s.forest.database(s.db).unwrap().contains_uuid(&uuid));
    assert_eq!(s.forest.find_entry_by_uuid(other_db, uuid).unwrap(), Some(s.b_entry));

    s.forest.move_entry(s.b_entry, s.b).unwrap();
    assert!(!s.forest.database(s.db).unwrap().deleted_objects().contains(&uuid));
    assert!(s.forest.database(other_db).unwrap().deleted_objects().contains(&uuid));
    assert_eq!(s.forest.find_entry_by_uuid(s.db, uuid).unwrap(), Some(s.b_entry));
    assert_eq!(s.forest.find_entry_by_uuid(other_db, uuid).unwrap(), None);
}

#[test]
fn test_group_returning_to_database_drops_tombstones() {
    let mut s = sample();
    let other_db = s.forest.create_database("Other");
    let other_root = s.forest.root_group(other_db).unwrap();

    s.forest.set_parent(s.a, other_root, None).unwrap();
    s.forest.set_parent(s.a, s.root, None).unwrap();

    let deleted = s.forest.database(s.db).unwrap().deleted_objects();
    assert!(deleted.is_empty());
    let a1_uuid = s.forest.group(s.a1).unwrap().uuid();
    assert!(s.forest.database(other_db).unwrap().deleted_objects().contains(&a1_uuid));
    assert_eq!(s.forest.find_group_by_uuid(s.db, a1_uuid).unwrap(), Some(s.a1));
}

#[test]
fn test_setters_notify_once_per_change() {
    let (mut forest, _, root) = forest_with_root();
    let recorder = EventRecorder::new();
    forest.subscribe(recorder.clone());

    let mut editor = forest.edit_group(root).unwrap();
    assert!(!editor.set_name("Root"));
    assert!(!editor.set_expanded(true));
    assert!(!editor.set_searching_enabled(TriState::Inherit));
    assert!(editor.set_expanded(false));
    assert!(editor.set_default_autotype_sequence("{USERNAME}{TAB}{PASSWORD}{ENTER}"));
    assert!(!editor.set_default_autotype_sequence("{USERNAME}{TAB}{PASSWORD}{ENTER}"));

    let data_changed = recorder
        .events()
        .into_iter()
        .filter(|e| matches!(e, TreeEvent::DataChanged { .. }))
        .count();
    assert_eq!(data_changed, 2);
}

#[test]
fn test_setter_touches_modification_time() {
    let (mut forest, _, root) = forest_with_root();
    let before = forest.group(root).unwrap().time_info().last_modified;

    forest.edit_group(root).unwrap().set_notes("changed");
    let after = forest.group(root).unwrap().time_info().last_modified;
    assert!(after >= before);

    let mut editor = forest.edit_group(root).unwrap();
    editor.set_update_timeinfo(false);
    let frozen = editor.group().time_info().last_modified;
    editor.set_notes("changed again");
    assert_eq!(editor.group().time_info().last_modified, frozen);
}

#[test]
fn test_entry_data_changed_republished_by_group() {
    let s = sample();
    let mut forest = s.forest;
    let recorder = EventRecorder::new();
    forest.subscribe(recorder.clone());

    forest.edit_entry(s.b_entry).unwrap().set_title("renamed");
    assert_eq!(
        recorder.events(),
        vec![
            TreeEvent::EntryDataChanged {
                group: s.b,
                entry: s.b_entry
            },
            TreeEvent::Modified { group: s.b },
        ]
    );
}

#[test]
fn test_search_empty_term_returns_preorder() {
    let (mut forest, _, root) = forest_with_root();
    let e1 = forest.add_entry(root, "e1").unwrap();
    let a = forest.add_group(root, "a").unwrap();
    let e2 = forest.add_entry(a, "e2").unwrap();
    let a1 = forest.add_group(a, "a1").unwrap();
    let e3 = forest.add_entry(a1, "e3").unwrap();
    let b = forest.add_group(root, "b").unwrap();
    let e4 = forest.add_entry(b, "e4").unwrap();
    let e5 = forest.add_entry(a, "e5").unwrap();

    let results = forest
        .search(root, "", CaseSensitivity::Insensitive, true)
        .unwrap();
    assert_eq!(results, vec![e1, e2, e5, e3, e4]);
}

#[test]
fn test_search_excludes_disabled_group_under_enabled_ancestor() {
    let (mut forest, _, root) = forest_with_root();
    forest
        .edit_group(root)
        .unwrap()
        .set_searching_enabled(TriState::Enable);
    let hidden = forest.add_group(root, "hidden").unwrap();
    forest
        .edit_group(hidden)
        .unwrap()
        .set_searching_enabled(TriState::Disable);
    forest.add_entry(hidden, "abc").unwrap();
    let visible = forest.add_entry(root, "abc").unwrap();
    forest.add_entry(root, "ABC").unwrap();

    let results = forest
        .search(root, "abc", CaseSensitivity::Sensitive, true)
        .unwrap();
    assert_eq!(results, vec![visible]);
}

#[test]
fn test_search_scenario() {
    let (mut forest, _, root) = forest_with_root();
    let a = forest.add_group(root, "A").unwrap();
    forest
        .edit_group(a)
        .unwrap()
        .set_searching_enabled(TriState::Disable);
    let secret = forest.add_entry(a, "abc-secret").unwrap();
    let other = forest.add_entry(root, "abc-other").unwrap();

    let results = forest
        .search(root, "abc", CaseSensitivity::Insensitive, true)
        .unwrap();
    assert_eq!(results, vec![other]);
    assert!(!results.contains(&secret));
}

#[test]
fn test_entry_moves_between_groups() {
    let mut s = sample();
    let recorder = EventRecorder::new();
    s.forest.subscribe(recorder.clone());

    s.forest.move_entry(s.b_entry, s.a2).unwrap();
    assert_eq!(
        recorder.names(),
        vec![
            "entry_about_to_remove",
            "entry_removed",
            "entry_about_to_add",
            "entry_added",
            "modified"
        ]
    );
    assert!(s.forest.group(s.b).unwrap().entries().is_empty());
    assert_eq!(s.forest.group(s.a2).unwrap().entries(), &[s.b_entry]);
    assert!(
        s.forest
            .database(s.db)
            .unwrap()
            .deleted_objects()
            .is_empty()
    );
}

#[test]
fn test_events_serialize_with_type_tag() {
    let (mut forest, _, root) = forest_with_root();
    let recorder = EventRecorder::new();
    forest.subscribe(recorder.clone());
    forest.add_group(root, "x").unwrap();

    let json = serde_json::to_value(recorder.events()).unwrap();
    assert_eq!(json[0]["type"], "about_to_add");
    assert_eq!(json[0]["index"], 0);
}
