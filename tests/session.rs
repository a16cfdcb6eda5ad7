//! Editing session state machine over an in-memory store

use roleperm::{
    Catalog, GrantEntry, GrantStore, MemoryStore, Module, PermError, Phase, Session, StaleGrant, SubModule,
    SubModuleState,
};

fn catalog() -> Catalog {
    Catalog::new(
        "test",
        vec![
            Module::flat("reports", ["Student Report", "Finance Report"]),
            Module::tree(
                "fees",
                vec![
                    SubModule::with_actions("Fees Invoice", ["Add", "Edit", "Delete"]),
                    SubModule::leaf("Search Due Fees"),
                ],
            ),
            Module::verbs("students"),
        ],
    )
    .unwrap()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn new_session_is_loading_and_rejects_edits() {
    let c = catalog();
    let store = MemoryStore::new();
    let id = store.insert("instructor", vec![]);
    let mut s = Session::new(&c, &store, id);
    assert_eq!(s.phase(), Phase::Loading);
    assert_eq!(s.toggle_leaf("reports", "Finance Report"), Err(PermError::Busy("loading")));
    assert_eq!(s.save(), Err(PermError::Busy("loading")));
    s.load().unwrap();
    assert_eq!(s.phase(), Phase::Ready);
    assert_eq!(s.name(), "instructor");
    assert!(s.toggle_leaf("reports", "Finance Report").unwrap());
}

#[test]
fn load_failure_is_distinct_and_recoverable() {
    let c = catalog();
    let store = MemoryStore::new();
    let id = store.insert("instructor", vec![GrantEntry::new("students", ["view"])]);
    store.fail_loads(true);
    let e = Session::open(&c, &store, id).err().unwrap();
    assert!(matches!(e, PermError::LoadFailed { role, .. } if role == id));
    assert!(!e.is_defect());

    let mut s = Session::new(&c, &store, id);
    assert!(s.load().is_err());
    assert_eq!(s.phase(), Phase::Loading);
    store.fail_loads(false);
    s.load().unwrap();
    assert!(s.state().is_granted("students", "view"));
}

#[test]
fn load_of_missing_role() {
    let c = catalog();
    let store = MemoryStore::new();
    let e = Session::open(&c, &store, 42).err().unwrap();
    assert_eq!(e.root(), &PermError::RoleNotFound("42".into()));
}

#[test]
fn stale_grants_are_reported_not_fatal() {
    let c = catalog();
    let store = MemoryStore::new();
    let id = store.insert(
        "clerk",
        vec![
            GrantEntry::new("legacy-module", ["view"]),
            GrantEntry::new("fees", ["Fees Invoice:Add", "Fees Invoice:Print"]),
        ],
    );
    let s = Session::open(&c, &store, id).unwrap();
    assert_eq!(
        s.stale(),
        [
            StaleGrant::Module { module: "legacy-module".into() },
            StaleGrant::Leaf { module: "fees".into(), leaf: "Fees Invoice:Print".into() },
        ]
    );
    assert!(!s.is_dirty());
    assert_eq!(s.sub_module_state("fees", "Fees Invoice").unwrap(), SubModuleState::Partial);
}

// ============================================================================
// Editing and saving
// ============================================================================

#[test]
fn edit_and_save() {
    let c = catalog();
    let store = MemoryStore::new();
    let id = store.insert("accountant", vec![GrantEntry::new("fees", ["Fees Invoice:Add"])]);
    let mut s = Session::open(&c, &store, id).unwrap();

    assert!(!s.toggle_sub_module("fees", "Fees Invoice").unwrap());
    assert!(s.toggle_fixed_verb("students", "view").unwrap());
    assert!(s.toggle_sub_module("fees", "Search Due Fees").unwrap());
    assert!(s.is_dirty());

    let saved = s.save().unwrap();
    assert_eq!(
        saved,
        vec![GrantEntry::new("fees", ["Search Due Fees"]), GrantEntry::new("students", ["view"])]
    );
    assert_eq!(s.phase(), Phase::Ready);
    assert!(!s.is_dirty());
    assert_eq!(store.load(id).unwrap().permissions, saved);
}

#[test]
fn save_clears_stale_grants_from_store() {
    let c = catalog();
    let store = MemoryStore::new();
    let id = store.insert("clerk", vec![GrantEntry::new("legacy-module", ["view"])]);
    let mut s = Session::open(&c, &store, id).unwrap();
    assert_eq!(s.stale().len(), 1);
    s.save().unwrap();
    assert!(s.stale().is_empty());
    assert!(store.get(id).unwrap().permissions.is_empty());
}

#[test]
fn save_failure_keeps_edits_and_allows_retry() {
    let c = catalog();
    let store = MemoryStore::new();
    let id = store.insert("librarian", vec![]);
    let mut s = Session::open(&c, &store, id).unwrap();
    s.toggle_leaf("reports", "Student Report").unwrap();

    store.fail_saves(true);
    let e = s.save().unwrap_err();
    assert!(matches!(e, PermError::SaveFailed { role, .. } if role == id));
    assert_eq!(s.phase(), Phase::ReadyWithError);
    assert_eq!(s.last_error(), Some(&e));
    assert!(s.state().is_granted("reports", "Student Report"));
    assert!(s.is_dirty());
    assert!(store.get(id).unwrap().permissions.is_empty());

    // Still editable after a failed save
    s.toggle_leaf("reports", "Finance Report").unwrap();

    store.fail_saves(false);
    let saved = s.save().unwrap();
    assert_eq!(saved, vec![GrantEntry::new("reports", ["Student Report", "Finance Report"])]);
    assert_eq!(s.phase(), Phase::Ready);
    assert!(s.last_error().is_none());
}

#[test]
fn rejected_toggle_does_not_poison_session() {
    let c = catalog();
    let store = MemoryStore::new();
    let id = store.insert("instructor", vec![]);
    let mut s = Session::open(&c, &store, id).unwrap();
    let e = s.toggle_leaf("fees", "Fees Invoice").unwrap_err();
    assert!(e.is_defect());
    assert_eq!(s.phase(), Phase::Ready);
    assert!(!s.is_dirty());
    assert!(s.save().unwrap().is_empty());
}

#[test]
fn discard_returns_to_baseline() {
    let c = catalog();
    let store = MemoryStore::new();
    let id = store.insert("instructor", vec![GrantEntry::new("students", ["view"])]);
    let mut s = Session::open(&c, &store, id).unwrap();
    s.toggle_module("students").unwrap();
    s.set_leaf("reports", "Finance Report", true).unwrap();
    assert!(s.is_dirty());
    s.discard().unwrap();
    assert!(!s.is_dirty());
    assert!(s.state().is_granted("students", "view"));
}

#[test]
fn replace_hydrates_incoming_list() {
    let c = catalog();
    let store = MemoryStore::new();
    let id = store.insert("instructor", vec![GrantEntry::new("students", ["view"])]);
    let mut s = Session::open(&c, &store, id).unwrap();
    let dropped = s
        .replace(&[GrantEntry::new("reports", ["Finance Report", "Fees Report"]), GrantEntry::new("old", ["x"])])
        .unwrap();
    assert_eq!(dropped.len(), 2);
    assert_eq!(s.stale(), dropped.as_slice());
    assert!(!s.state().is_granted("students", "view"));
    assert_eq!(s.save().unwrap(), vec![GrantEntry::new("reports", ["Finance Report"])]);
}

#[test]
fn reload_picks_up_external_changes() {
    let c = catalog();
    let store = MemoryStore::new();
    let id = store.insert("instructor", vec![]);
    let mut s = Session::open(&c, &store, id).unwrap();
    s.toggle_leaf("reports", "Finance Report").unwrap();

    store.save(id, &[GrantEntry::new("students", ["edit"])]).unwrap();
    store.fail_loads(true);
    assert!(s.reload().is_err());
    assert!(s.state().is_granted("reports", "Finance Report"));

    store.fail_loads(false);
    s.reload().unwrap();
    assert!(!s.state().is_granted("reports", "Finance Report"));
    assert!(s.state().is_granted("students", "edit"));
}

#[test]
fn session_tree_reflects_state() {
    let c = catalog();
    let store = MemoryStore::new();
    let id = store.insert("instructor", vec![GrantEntry::new("fees", ["Fees Invoice:Edit"])]);
    let s = Session::open(&c, &store, id).unwrap();
    let tree = s.tree();
    let fees = tree.iter().find(|m| m.name == "fees").unwrap();
    assert!(fees.checked);
    let inv = &fees.sub_modules[0];
    assert!(inv.checked);
    assert_eq!(inv.state, SubModuleState::Partial);
    assert_eq!(inv.actions.iter().filter(|a| a.checked).count(), 1);
    assert!(!tree.iter().find(|m| m.name == "reports").unwrap().checked);
}

#[test]
fn tree_header_states_match_state_queries() {
    let c = catalog();
    let store = MemoryStore::new();
    let id = store.insert("instructor", vec![GrantEntry::new("fees", ["Fees Invoice:Add", "Search Due Fees"])]);
    let mut s = Session::open(&c, &store, id).unwrap();
    for _ in 0..3 {
        for node in s.tree().iter().filter(|m| m.name == "fees") {
            for sub in &node.sub_modules {
                assert_eq!(sub.state, s.sub_module_state("fees", &sub.name).unwrap(), "{}", sub.name);
            }
        }
        s.toggle_leaf("fees", "Fees Invoice:Edit").unwrap();
        s.toggle_sub_module("fees", "Search Due Fees").unwrap();
    }
}
