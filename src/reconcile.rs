//! Compute and apply the grants and revocations that move current assignments to a requested
//! state.
//!
//! Planning reads the store once and fixes the whole action list up front; applying walks that
//! list in order. A plan always has the shape:
//!
//! 1. bulk removals (revoke-all, revoke-others, revoke-pattern),
//! 2. grants missing from the current state,
//! 3. explicit revocations of assignments currently present.
//!
//! Bulk removals never touch anything in the grant set, so nothing is revoked and granted back
//! in the same pass. Nothing is retried or rolled back: a failed store call stops the pass and
//! leaves earlier actions applied.

use crate::entry::{Principal, Privilege};
use crate::error::UserRightsError;
use crate::request::{PrincipalRequest, PrivilegeRequest, Removal};
use crate::store::PolicyStore;
use simple_error::SimpleError;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Op {
    Grant,
    Revoke,
}

/// A single grant or revocation of one privilege for one principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Action {
    pub op: Op,
    pub principal: Principal,
    pub privilege: Privilege,
}

impl Action {
    pub fn new(op: Op, principal: &Principal, privilege: &Privilege) -> Action {
        Action {
            op,
            principal: principal.clone(),
            privilege: privilege.clone(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Op::Grant => write!(f, "grant {} to {}", self.privilege, self.principal),
            Op::Revoke => write!(f, "revoke {} from {}", self.privilege, self.principal),
        }
    }
}

/// Plan the actions for a principal request from a single read of its current privileges.
pub fn plan_principal<S: PolicyStore + ?Sized>(
    store: &S,
    request: &PrincipalRequest,
) -> Result<Vec<Action>, UserRightsError> {
    let principal = &request.principal;
    let current = store.privileges_of(principal)?;
    debug!(%principal, count = current.len(), "read current privileges");

    let revoke = |privilege: &Privilege| Action::new(Op::Revoke, principal, privilege);
    let grant = |privilege: &Privilege| Action::new(Op::Grant, principal, privilege);

    if matches!(request.removal, Removal::All) {
        return Ok(current.iter().map(revoke).collect());
    }

    let mut actions: Vec<Action> = Vec::new();
    match &request.removal {
        Removal::Others => actions.extend(current.difference(&request.grant).map(revoke)),
        // Privileges are never matched by pattern.
        Removal::Pattern(_) | Removal::None | Removal::Explicit(_) | Removal::All => {}
    }
    actions.extend(request.grant.difference(&current).map(grant));
    if let Removal::Explicit(revoked) = &request.removal {
        actions.extend(revoked.intersection(&current).map(revoke));
    }
    Ok(actions)
}

/// Plan the actions for a privilege request from a single read of its current holders.
pub fn plan_privilege<S: PolicyStore + ?Sized>(
    store: &S,
    request: &PrivilegeRequest,
) -> Result<Vec<Action>, UserRightsError> {
    let privilege = &request.privilege;
    let current = store.principals_with(Some(privilege))?;
    debug!(%privilege, count = current.len(), "read current holders");

    let revoke = |principal: &Principal| Action::new(Op::Revoke, principal, privilege);
    let grant = |principal: &Principal| Action::new(Op::Grant, principal, privilege);

    if matches!(request.removal, Removal::All) {
        return Ok(current.iter().map(revoke).collect());
    }

    let mut actions: Vec<Action> = Vec::new();
    let others = current.difference(&request.grant);
    match &request.removal {
        Removal::Others => actions.extend(others.map(revoke)),
        Removal::Pattern(pattern) => {
            actions.extend(others.filter(|p| pattern.is_match(p)).map(revoke))
        }
        Removal::None | Removal::Explicit(_) | Removal::All => {}
    }
    actions.extend(request.grant.difference(&current).map(grant));
    if let Removal::Explicit(revoked) = &request.removal {
        actions.extend(revoked.intersection(&current).map(revoke));
    }
    Ok(actions)
}

/// Execute `actions` in order, one store call per action. With `dry_run` only log them.
///
/// # Errors
/// The first failing store call, after logging it with its principal and privilege. The
/// remaining actions are not attempted.
pub fn apply<S: PolicyStore + ?Sized>(
    store: &mut S,
    actions: &[Action],
    dry_run: bool,
) -> Result<(), UserRightsError> {
    for action in actions {
        let Action {
            op,
            principal,
            privilege,
        } = action;
        if dry_run {
            info!(%principal, %privilege, "would {}", action);
            continue;
        }
        let privileges = std::slice::from_ref(privilege);
        let result = match op {
            Op::Grant => store.grant(principal, privileges),
            Op::Revoke => store.revoke(principal, privileges),
        };
        match result {
            Ok(()) => info!(%principal, %privilege, "{}", action),
            Err(err) => {
                error!(%principal, %privilege, "failed to {}: {}", action, err);
                return Err(err);
            }
        }
    }
    Ok(())
}

/// Bring the privileges of one principal to the requested state.
///
/// Returns the actions taken, or under dry-run, the actions that would have been taken.
///
/// # Errors
/// * `UserRightsError::InvalidArgument`: The request is internally inconsistent.
/// * Any store error, see [`apply()`].
pub fn reconcile_principal<S: PolicyStore + ?Sized>(
    store: &mut S,
    request: &PrincipalRequest,
) -> Result<Vec<Action>, UserRightsError> {
    check_consistency(request.principal.as_str(), &request.grant, &request.removal)?;
    if let Removal::Pattern(_) = request.removal {
        return Err(SimpleError::new("revoke-pattern does not apply to a principal").into());
    }
    let actions = plan_principal(&*store, request)?;
    apply(store, &actions, request.dry_run)?;
    Ok(actions)
}

/// Bring the holders of one privilege to the requested state.
///
/// Returns the actions taken, or under dry-run, the actions that would have been taken.
///
/// # Errors
/// * `UserRightsError::InvalidArgument`: The request is internally inconsistent.
/// * Any store error, see [`apply()`].
pub fn reconcile_privilege<S: PolicyStore + ?Sized>(
    store: &mut S,
    request: &PrivilegeRequest,
) -> Result<Vec<Action>, UserRightsError> {
    check_consistency(request.privilege.as_str(), &request.grant, &request.removal)?;
    let actions = plan_privilege(&*store, request)?;
    apply(store, &actions, request.dry_run)?;
    Ok(actions)
}

/// Last-line check of the invariants validation establishes.
pub(crate) fn check_consistency<T: Ord + fmt::Display>(
    target: &str,
    grant: &BTreeSet<T>,
    removal: &Removal<T>,
) -> Result<(), SimpleError> {
    if target.is_empty() {
        return Err(SimpleError::new("empty target"));
    }
    match removal {
        Removal::None if grant.is_empty() => {
            bail!("no action for {}", target);
        }
        Removal::All if !grant.is_empty() => {
            bail!("revoke-all with grants for {}", target);
        }
        Removal::Others if grant.is_empty() => {
            bail!("revoke-others without grants for {}", target);
        }
        Removal::Explicit(revoke) => {
            if let Some(both) = grant.intersection(revoke).next() {
                bail!("{} is both granted and revoked for {}", both, target);
            }
        }
        _ => {}
    }
    Ok(())
}
