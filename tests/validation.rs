//! Option-combination rules for principal and privilege changes.

use proptest::prelude::*;
use user_rights::{
    validate_principal_change, validate_privilege_change, PrincipalChange, PrivilegeChange,
    Removal, UserRightsError,
};

fn principal_change(grant: &[&str], revoke: &[&str]) -> PrincipalChange {
    PrincipalChange {
        principal: "S-1-5-20".into(),
        grant: grant.iter().map(|s| s.to_string()).collect(),
        revoke: revoke.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn privilege_change(grant: &[&str], revoke: &[&str]) -> PrivilegeChange {
    PrivilegeChange {
        privilege: "SeServiceLogonRight".into(),
        grant: grant.iter().map(|s| s.to_string()).collect(),
        revoke: revoke.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

#[test]
fn principal_grant_only() {
    assert!(principal_change(&["SeServiceLogonRight"], &[]).validate().is_empty());
}

#[test]
fn principal_grant_and_revoke() {
    let change = principal_change(&["SeServiceLogonRight"], &["SeBatchLogonRight"]);
    assert!(validate_principal_change(&change).is_empty());
}

#[test]
fn principal_missing() {
    let mut change = principal_change(&["SeServiceLogonRight"], &[]);
    change.principal = "   ".into();
    assert_eq!(change.validate(), ["A principal is required."]);
}

#[test]
fn principal_no_action() {
    assert_eq!(
        principal_change(&[], &[]).validate(),
        ["No action specified: use grant, revoke or revoke-all."]
    );
}

#[test]
fn principal_blank_entries() {
    assert_eq!(
        principal_change(&["SeA", " "], &[""]).validate(),
        [
            "Grant entries must not be empty or whitespace.",
            "Revoke entries must not be empty or whitespace.",
        ]
    );
}

#[test]
fn principal_overlap_and_duplicates_reported_together() {
    let change = principal_change(
        &["SeServiceLogonRight", "seservicelogonright"],
        &["SESERVICELOGONRIGHT"],
    );
    assert_eq!(
        change.validate(),
        [
            "Grant entries contain duplicates.",
            "Entries cannot be both granted and revoked: seservicelogonright.",
        ]
    );
}

#[test]
fn principal_revoke_all_alone() {
    let mut change = principal_change(&[], &[]);
    change.revoke_all = true;
    assert!(change.validate().is_empty());
    assert_eq!(change.into_request().unwrap().removal, Removal::All);
}

#[test]
fn principal_revoke_all_exclusive() {
    let mut change = principal_change(&["SeA"], &["SeB"]);
    change.revoke_all = true;
    change.revoke_others = true;
    assert_eq!(
        change.validate(),
        [
            "revoke-all cannot be combined with revoke-others.",
            "revoke-all cannot be combined with grant.",
            "revoke-all cannot be combined with revoke.",
            "revoke-others cannot be combined with revoke.",
        ]
    );
}

#[test]
fn principal_revoke_others_requires_grant() {
    let mut change = principal_change(&[], &[]);
    change.revoke_others = true;
    assert_eq!(
        change.validate(),
        [
            "No action specified: use grant, revoke or revoke-all.",
            "revoke-others requires grant.",
        ]
    );
}

#[test]
fn principal_into_request() {
    let mut change = principal_change(&["SeA"], &[]);
    change.revoke_others = true;
    change.dry_run = true;
    let request = change.into_request().unwrap();
    assert_eq!(request.principal.as_str(), "S-1-5-20");
    assert_eq!(request.removal, Removal::Others);
    assert!(request.dry_run);

    let request = principal_change(&["SeA"], &["SeB", "SeC"]).into_request().unwrap();
    match request.removal {
        Removal::Explicit(revoke) => assert_eq!(revoke.len(), 2),
        other => panic!("unexpected removal {:?}", other),
    }
}

#[test]
fn principal_into_request_carries_all_violations() {
    let err = principal_change(&[], &[]).into_request().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    assert_eq!(err.violations().len(), 1);
    assert!(matches!(err, UserRightsError::Validation(_)));
}

#[test]
fn privilege_missing() {
    let mut change = privilege_change(&["S-1-5-20"], &[]);
    change.privilege = "".into();
    assert_eq!(change.validate(), ["A privilege is required."]);
}

#[test]
fn privilege_no_action() {
    assert_eq!(
        privilege_change(&[], &[]).validate(),
        ["No action specified: use grant, revoke, revoke-all or revoke-pattern."]
    );
}

#[test]
fn privilege_pattern_alone() {
    let mut change = privilege_change(&[], &[]);
    change.revoke_pattern = Some("^S-1-5-21-".into());
    assert!(validate_privilege_change(&change).is_empty());
    match change.into_request().unwrap().removal {
        Removal::Pattern(pattern) => assert_eq!(pattern.as_str(), "^S-1-5-21-"),
        other => panic!("unexpected removal {:?}", other),
    }
}

#[test]
fn privilege_pattern_with_grant() {
    let mut change = privilege_change(&["S-1-5-20"], &[]);
    change.revoke_pattern = Some("^S-1-5-21-".into());
    assert!(change.validate().is_empty());
}

#[test]
fn privilege_pattern_exclusive() {
    let mut change = privilege_change(&["S-1-5-20"], &["S-1-5-19"]);
    change.revoke_pattern = Some(".*".into());
    change.revoke_others = true;
    assert_eq!(
        change.validate(),
        [
            "revoke-others cannot be combined with revoke.",
            "revoke-others cannot be combined with revoke-pattern.",
            "revoke-pattern cannot be combined with revoke.",
        ]
    );
}

#[test]
fn privilege_revoke_all_exclusive() {
    let mut change = privilege_change(&[], &[]);
    change.revoke_all = true;
    change.revoke_pattern = Some(".*".into());
    assert_eq!(
        change.validate(),
        ["revoke-all cannot be combined with revoke-pattern."]
    );
}

#[test]
fn privilege_invalid_pattern() {
    let mut change = privilege_change(&[], &[]);
    change.revoke_pattern = Some("(S-1-5".into());
    let violations = change.validate();
    assert_eq!(violations.len(), 1);
    assert!(violations[0].starts_with("Invalid revoke-pattern:"), "{}", violations[0]);

    let err = change.into_request().unwrap_err();
    assert_eq!(err.violations(), violations.as_slice());
}

#[test]
fn privilege_duplicate_principals() {
    assert_eq!(
        privilege_change(&["S-1-5-20", "s-1-5-20"], &["alice", "Alice"]).validate(),
        [
            "Grant entries contain duplicates.",
            "Revoke entries contain duplicates.",
        ]
    );
}

/// Entries that differ only in surrounding whitespace name the same privilege.
#[test]
fn padded_entries_are_duplicates() {
    assert_eq!(
        principal_change(&[" SeA", "SeA"], &["SeB "]).validate(),
        ["Grant entries contain duplicates."]
    );
    assert_eq!(
        principal_change(&["SeA"], &[" sea "]).validate(),
        ["Entries cannot be both granted and revoked: sea."]
    );
}

fn entries() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("Se[A-Z][a-z]{0,3}", 0..4)
}

proptest! {
    #[test]
    fn revoke_all_rejects_any_combination(
        grant in entries(),
        revoke in entries(),
        revoke_others in any::<bool>(),
    ) {
        prop_assume!(!grant.is_empty() || !revoke.is_empty() || revoke_others);
        let change = PrincipalChange {
            principal: "S-1-5-20".into(),
            grant,
            revoke,
            revoke_all: true,
            revoke_others,
            dry_run: false,
        };
        prop_assert!(!change.validate().is_empty());
    }

    #[test]
    fn revoke_others_needs_grant_only(
        grant in entries(),
        revoke in entries(),
        revoke_all in any::<bool>(),
    ) {
        let change = PrincipalChange {
            principal: "S-1-5-20".into(),
            grant: grant.clone(),
            revoke: revoke.clone(),
            revoke_all,
            revoke_others: true,
            dry_run: false,
        };
        let shaped = !grant.is_empty() && !revoke_all && revoke.is_empty();
        if !shaped {
            prop_assert!(!change.validate().is_empty());
        }
    }

    #[test]
    fn privilege_bulk_modes_exclusive(
        revoke_all in any::<bool>(),
        revoke_others in any::<bool>(),
        pattern in any::<bool>(),
        grant in entries(),
    ) {
        let modes = [revoke_all, revoke_others, pattern].iter().filter(|m| **m).count();
        let change = PrivilegeChange {
            privilege: "SeServiceLogonRight".into(),
            grant,
            revoke: vec![],
            revoke_all,
            revoke_others,
            revoke_pattern: if pattern { Some("^S-1-5-21-".into()) } else { None },
            dry_run: false,
        };
        if modes > 1 {
            prop_assert!(!change.validate().is_empty());
        }
    }
}
