//! Unit tests using internal API.
//!
//! For testing public API (e.g. integration tests), use the files in `tests/` instead.

use crate::reconcile::check_consistency;
use crate::{
    reconcile_principal, MemoryStore, PolicyStore, Principal, PrincipalRequest, Privilege,
    RevokePattern, Removal, UserRightsError,
};
use std::collections::BTreeSet;

fn privileges(names: &[&str]) -> BTreeSet<Privilege> {
    names.iter().copied().map(Privilege::new).collect()
}

#[test]
fn consistency_accepts_valid_shapes() {
    assert!(check_consistency("S-1-5-20", &privileges(&["SeA"]), &Removal::None).is_ok());
    assert!(check_consistency("S-1-5-20", &privileges(&[]), &Removal::All).is_ok());
    assert!(check_consistency("S-1-5-20", &privileges(&["SeA"]), &Removal::Others).is_ok());
    assert!(check_consistency(
        "S-1-5-20",
        &privileges(&["SeA"]),
        &Removal::Explicit(privileges(&["SeB"]))
    )
    .is_ok());
}

#[test]
fn consistency_rejects_contradictions() {
    let err = check_consistency("S-1-5-20", &privileges(&["SeA"]), &Removal::All).unwrap_err();
    assert_eq!(err.as_str(), "revoke-all with grants for S-1-5-20");

    let err = check_consistency("S-1-5-20", &privileges(&[]), &Removal::Others).unwrap_err();
    assert_eq!(err.as_str(), "revoke-others without grants for S-1-5-20");

    let err = check_consistency(
        "S-1-5-20",
        &privileges(&["SeA"]),
        &Removal::Explicit(privileges(&["sea"])),
    )
    .unwrap_err();
    assert_eq!(err.as_str(), "SeA is both granted and revoked for S-1-5-20");

    let err = check_consistency("", &privileges(&["SeA"]), &Removal::None).unwrap_err();
    assert_eq!(err.as_str(), "empty target");

    let err = check_consistency("S-1-5-20", &privileges(&[]), &Removal::None).unwrap_err();
    assert_eq!(err.as_str(), "no action for S-1-5-20");
}

/// Hand-built requests bypass validation; the engine still refuses them before touching the store.
#[test]
fn reconcile_refuses_inconsistent_request() {
    let mut store = MemoryStore::new().with_assignment("S-1-5-20", "SeA");
    store.connect(None).unwrap();
    let request = PrincipalRequest {
        principal: Principal::new("S-1-5-20"),
        grant: privileges(&["SeB"]),
        removal: Removal::All,
        dry_run: false,
    };
    let err = reconcile_principal(&mut store, &request).unwrap_err();
    assert!(matches!(err, UserRightsError::InvalidArgument(_)));
    assert!(store.calls().is_empty());

    let request = PrincipalRequest {
        removal: Removal::Pattern(RevokePattern::new(".*").unwrap()),
        ..request
    };
    let err = reconcile_principal(&mut store, &request).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid argument: revoke-pattern does not apply to a principal"
    );
}

#[test]
fn pattern_size_limit() {
    let err = RevokePattern::new(r"(?:\w{1000}){1000}").unwrap_err();
    assert!(err.contains("size limit"), "{}", err);
}

#[test]
fn pattern_matches_identity_text() {
    let pattern = RevokePattern::new("^S-1-5-21-").unwrap();
    assert!(pattern.is_match(&Principal::new("S-1-5-21-1004336348-1177238915-682003330-512")));
    assert!(!pattern.is_match(&Principal::new("S-1-5-32-544")));
    assert_eq!(format!("{:?}", pattern), r#"RevokePattern("^S-1-5-21-")"#);
}

#[test]
fn privilege_case_folding() {
    assert_eq!(Privilege::new("SeDebugPrivilege"), Privilege::new("sedebugprivilege"));
    assert_eq!(Privilege::new(" SeDebugPrivilege ").as_str(), "SeDebugPrivilege");
    assert_eq!(privileges(&["SeA", "sea", "SEA"]).len(), 1);
    assert_ne!(Principal::new("alice"), Principal::new("ALICE"));
}

#[test]
fn sid_text_is_canonical() {
    assert_eq!(Principal::new(" s-1-5-20 "), Principal::new("S-1-5-20"));
    assert_eq!(Principal::new("s-1-0xabcdef123456-7").as_str(), "S-1-0xABCDEF123456-7");
    assert!(Principal::new("s-1-5-32-544").is_sid());
    assert!(!Principal::new("S-1-").is_sid());
    assert!(!Principal::new("S-1-5--20").is_sid());
    assert!(!Principal::new(r"CONTOSO\alice").is_sid());
}

#[test]
fn non_ascii_names_are_not_sids() {
    for name in ["Ñoño", "Ñ", "S-1ñ", "sé-1-5"] {
        let principal = Principal::new(name);
        assert!(!principal.is_sid());
        assert_eq!(principal.as_str(), name);
    }
}

#[test]
fn memory_store_empty_privilege_list() {
    let mut store = MemoryStore::new();
    store.connect(None).unwrap();
    let err = store.grant(&Principal::new("S-1-5-20"), &[]).unwrap_err();
    assert_eq!(err.to_string(), "Invalid argument: No privileges given for S-1-5-20");
    let err = store.revoke(&Principal::new("S-1-5-20"), &[]).unwrap_err();
    assert!(matches!(err, UserRightsError::InvalidArgument(_)));
}
