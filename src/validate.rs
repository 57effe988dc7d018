//! Option-combination rules for requested changes.
//!
//! Every rule is checked and all violations are returned together, so a caller can report every
//! problem at once. Nothing here touches a policy store.

use crate::pattern::RevokePattern;
use crate::request::{PrincipalChange, PrivilegeChange};
use std::collections::BTreeSet;

/// All violations of a principal change, empty if it is well-formed.
pub fn validate_principal_change(change: &PrincipalChange) -> Vec<String> {
    check_principal_change(change)
}

/// All violations of a privilege change, empty if it is well-formed.
///
/// A revoke pattern is compiled as part of validation, see [`RevokePattern::new()`].
pub fn validate_privilege_change(change: &PrivilegeChange) -> Vec<String> {
    check_privilege_change(change).0
}

pub(crate) fn check_principal_change(change: &PrincipalChange) -> Vec<String> {
    let mut violations = Vec::new();
    let grant = !change.grant.is_empty();
    let revoke = !change.revoke.is_empty();

    if change.principal.trim().is_empty() {
        violations.push("A principal is required.".to_string());
    }
    if !grant && !revoke && !change.revoke_all {
        violations.push("No action specified: use grant, revoke or revoke-all.".to_string());
    }
    check_entries(&change.grant, &change.revoke, &mut violations);

    if change.revoke_all {
        if change.revoke_others {
            violations.push("revoke-all cannot be combined with revoke-others.".to_string());
        }
        if grant {
            violations.push("revoke-all cannot be combined with grant.".to_string());
        }
        if revoke {
            violations.push("revoke-all cannot be combined with revoke.".to_string());
        }
    }
    if change.revoke_others {
        if !grant {
            violations.push("revoke-others requires grant.".to_string());
        }
        if revoke {
            violations.push("revoke-others cannot be combined with revoke.".to_string());
        }
    }
    violations
}

/// Validate a privilege change, also returning the compiled pattern when one was given and it
/// compiled.
pub(crate) fn check_privilege_change(
    change: &PrivilegeChange,
) -> (Vec<String>, Option<RevokePattern>) {
    let mut violations = Vec::new();
    let grant = !change.grant.is_empty();
    let revoke = !change.revoke.is_empty();
    let pattern = change.revoke_pattern.is_some();

    if change.privilege.trim().is_empty() {
        violations.push("A privilege is required.".to_string());
    }
    if !grant && !revoke && !change.revoke_all && !pattern {
        violations.push(
            "No action specified: use grant, revoke, revoke-all or revoke-pattern.".to_string(),
        );
    }
    check_entries(&change.grant, &change.revoke, &mut violations);

    if change.revoke_all {
        if change.revoke_others {
            violations.push("revoke-all cannot be combined with revoke-others.".to_string());
        }
        if pattern {
            violations.push("revoke-all cannot be combined with revoke-pattern.".to_string());
        }
        if grant {
            violations.push("revoke-all cannot be combined with grant.".to_string());
        }
        if revoke {
            violations.push("revoke-all cannot be combined with revoke.".to_string());
        }
    }
    if change.revoke_others {
        if !grant {
            violations.push("revoke-others requires grant.".to_string());
        }
        if revoke {
            violations.push("revoke-others cannot be combined with revoke.".to_string());
        }
        if pattern {
            violations.push("revoke-others cannot be combined with revoke-pattern.".to_string());
        }
    }
    if pattern && revoke {
        violations.push("revoke-pattern cannot be combined with revoke.".to_string());
    }

    let compiled = match &change.revoke_pattern {
        Some(expr) => match RevokePattern::new(expr) {
            Ok(compiled) => Some(compiled),
            Err(err) => {
                violations.push(format!("Invalid revoke-pattern: {}", err));
                None
            }
        },
        None => None,
    };
    (violations, compiled)
}

/// Rules shared by both modes on the grant and revoke lists themselves.
fn check_entries(grant: &[String], revoke: &[String], violations: &mut Vec<String>) {
    if grant.iter().any(|e| e.trim().is_empty()) {
        violations.push("Grant entries must not be empty or whitespace.".to_string());
    }
    if revoke.iter().any(|e| e.trim().is_empty()) {
        violations.push("Revoke entries must not be empty or whitespace.".to_string());
    }

    let grant_set = folded(grant);
    let revoke_set = folded(revoke);
    // Duplicates are detected by cardinality, not by counting each token.
    if grant_set.len() != grant.len() {
        violations.push("Grant entries contain duplicates.".to_string());
    }
    if revoke_set.len() != revoke.len() {
        violations.push("Revoke entries contain duplicates.".to_string());
    }

    let overlap: Vec<&str> = grant_set
        .intersection(&revoke_set)
        .filter(|e| !e.is_empty())
        .map(String::as_str)
        .collect();
    if !overlap.is_empty() {
        violations.push(format!(
            "Entries cannot be both granted and revoked: {}.",
            overlap.join(", ")
        ));
    }
}

fn folded(entries: &[String]) -> BTreeSet<String> {
    entries.iter().map(|e| e.trim().to_lowercase()).collect()
}
