//! Listing every assignment, and writing listings out.

use std::fs;
use tempfile::tempdir;
use user_rights::{
    list_assignments, write_json, write_table, MemoryStore, PolicyStore, UserRightEntry,
    UserRightsError,
};

fn fixture() -> MemoryStore {
    // "A" cannot be translated, as if it came from a remote host.
    let mut store = MemoryStore::new()
        .with_assignment("A", "P1")
        .with_assignment("B", "P1")
        .with_assignment("B", "P2")
        .with_name("B", r"HOST\b");
    store.connect(None).unwrap();
    store
}

fn remote_principal_fixture() -> MemoryStore {
    let mut store = MemoryStore::new()
        .with_assignment("S-1-5-32-544", "SeBackupPrivilege")
        .with_assignment("S-1-5-32-544", "sedebugprivilege")
        .with_assignment("s-1-5-21-99-1001", "SeDebugPrivilege")
        .with_assignment("S-1-5-20", "SeServiceLogonRight")
        .with_name("S-1-5-32-544", r"BUILTIN\Administrators")
        .with_name("S-1-5-20", r"NT AUTHORITY\NETWORK SERVICE");
    store.connect(None).unwrap();
    store
}

fn rows(entries: &[UserRightEntry]) -> Vec<[String; 3]> {
    entries
        .iter()
        .map(|e| {
            [
                e.privilege.to_string(),
                e.principal.to_string(),
                e.account_name.clone(),
            ]
        })
        .collect()
}

#[test]
fn three_entries_sorted() {
    let store = fixture();
    let entries = list_assignments(&store).unwrap();
    assert_eq!(
        rows(&entries),
        [
            ["P1", "A", ""],
            ["P1", "B", r"HOST\b"],
            ["P2", "B", r"HOST\b"],
        ]
    );
}

#[test]
fn unresolvable_names_are_empty() {
    let store = remote_principal_fixture();
    let entries = list_assignments(&store).unwrap();
    assert_eq!(
        rows(&entries),
        [
            ["SeBackupPrivilege", "S-1-5-32-544", r"BUILTIN\Administrators"],
            ["SeDebugPrivilege", "S-1-5-21-99-1001", ""],
            ["sedebugprivilege", "S-1-5-32-544", r"BUILTIN\Administrators"],
            ["SeServiceLogonRight", "S-1-5-20", r"NT AUTHORITY\NETWORK SERVICE"],
        ]
    );
}

#[test]
fn listing_does_not_mutate() {
    let store = remote_principal_fixture();
    let before = store.assignments();
    list_assignments(&store).unwrap();
    assert_eq!(store.assignments(), before);
    assert!(store.calls().is_empty());
}

#[test]
fn empty_store() {
    let mut store = MemoryStore::new();
    store.connect(None).unwrap();
    assert!(list_assignments(&store).unwrap().is_empty());
}

#[test]
fn list_not_connected() {
    let store = MemoryStore::new().with_assignment("A", "P1");
    assert!(matches!(
        list_assignments(&store),
        Err(UserRightsError::NotConnected)
    ));
}

#[test]
fn table_output() {
    let entries = list_assignments(&fixture()).unwrap();
    let mut out = Vec::new();
    write_table(&mut out, &entries).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Privilege  Principal  Account\n\
         P1         A\n\
         P1         B          HOST\\b\n\
         P2         B          HOST\\b\n"
    );
}

#[test]
fn json_output_to_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rights.json");
    let entries = list_assignments(&fixture()).unwrap();
    write_json(fs::File::create(&path).unwrap(), &entries).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let written: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        written,
        serde_json::json!([
            {"privilege": "P1", "principal": "A", "account_name": ""},
            {"privilege": "P1", "principal": "B", "account_name": "HOST\\b"},
            {"privilege": "P2", "principal": "B", "account_name": "HOST\\b"},
        ])
    );
}
