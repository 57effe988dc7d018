//! Requested changes, in raw form as given on the command line and in validated, typed form.

use crate::entry::{Principal, Privilege};
use crate::error::UserRightsError;
use crate::pattern::RevokePattern;
use crate::store::PolicyStore;
use crate::validate::{check_principal_change, check_privilege_change};
use std::collections::BTreeSet;

/// Raw options for changing the privileges held by one principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipalChange {
    pub principal: String,
    pub grant: Vec<String>,
    pub revoke: Vec<String>,
    pub revoke_all: bool,
    pub revoke_others: bool,
    pub dry_run: bool,
}

/// Raw options for changing the principals holding one privilege.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivilegeChange {
    pub privilege: String,
    pub grant: Vec<String>,
    pub revoke: Vec<String>,
    pub revoke_all: bool,
    pub revoke_others: bool,
    pub revoke_pattern: Option<String>,
    pub dry_run: bool,
}

/// Which current assignments a request removes. The bulk modes are mutually exclusive, so
/// they are variants rather than flags.
#[derive(Debug, Clone, PartialEq)]
pub enum Removal<T: Ord> {
    /// Only grant.
    None,
    /// Remove every current assignment. Never combined with grants.
    All,
    /// Remove every current assignment not in the grant set.
    Others,
    /// Remove the listed assignments, where present.
    Explicit(BTreeSet<T>),
    /// Remove current assignments whose principal matches, except those in the grant set.
    /// Only valid for privilege requests.
    Pattern(RevokePattern),
}

/// A validated change to the privileges of `principal`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrincipalRequest {
    pub principal: Principal,
    pub grant: BTreeSet<Privilege>,
    pub removal: Removal<Privilege>,
    pub dry_run: bool,
}

/// A validated change to the principals holding `privilege`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivilegeRequest {
    pub privilege: Privilege,
    pub grant: BTreeSet<Principal>,
    pub removal: Removal<Principal>,
    pub dry_run: bool,
}

impl PrincipalChange {
    /// All violations of this change, empty if it is well-formed.
    pub fn validate(&self) -> Vec<String> {
        check_principal_change(self)
    }

    /// Validate and convert into a [`PrincipalRequest`].
    ///
    /// # Errors
    /// * `UserRightsError::Validation`: carrying every violation found.
    pub fn into_request(self) -> Result<PrincipalRequest, UserRightsError> {
        let violations = self.validate();
        if !violations.is_empty() {
            return Err(UserRightsError::Validation(violations));
        }
        let removal = if self.revoke_all {
            Removal::All
        } else if self.revoke_others {
            Removal::Others
        } else if !self.revoke.is_empty() {
            Removal::Explicit(self.revoke.iter().map(Privilege::new).collect())
        } else {
            Removal::None
        };
        Ok(PrincipalRequest {
            principal: Principal::new(&self.principal),
            grant: self.grant.iter().map(Privilege::new).collect(),
            removal,
            dry_run: self.dry_run,
        })
    }
}

impl PrivilegeChange {
    /// All violations of this change, empty if it is well-formed.
    pub fn validate(&self) -> Vec<String> {
        check_privilege_change(self).0
    }

    /// Validate and convert into a [`PrivilegeRequest`]. The revoke pattern is compiled once,
    /// during validation.
    ///
    /// # Errors
    /// * `UserRightsError::Validation`: carrying every violation found.
    pub fn into_request(self) -> Result<PrivilegeRequest, UserRightsError> {
        let (violations, pattern) = check_privilege_change(&self);
        if !violations.is_empty() {
            return Err(UserRightsError::Validation(violations));
        }
        let removal = if self.revoke_all {
            Removal::All
        } else if self.revoke_others {
            Removal::Others
        } else if let Some(pattern) = pattern {
            Removal::Pattern(pattern)
        } else if !self.revoke.is_empty() {
            Removal::Explicit(self.revoke.iter().map(Principal::new).collect())
        } else {
            Removal::None
        };
        Ok(PrivilegeRequest {
            privilege: Privilege::new(&self.privilege),
            grant: self.grant.iter().map(Principal::new).collect(),
            removal,
            dry_run: self.dry_run,
        })
    }
}

impl PrincipalRequest {
    /// Translate the target from account name to identity using `store`.
    pub fn resolve<S: PolicyStore + ?Sized>(mut self, store: &S) -> Result<Self, UserRightsError> {
        self.principal = store.resolve_principal(self.principal.as_str())?;
        Ok(self)
    }
}

impl PrivilegeRequest {
    /// Translate every granted and explicitly revoked account name to an identity using `store`.
    pub fn resolve<S: PolicyStore + ?Sized>(mut self, store: &S) -> Result<Self, UserRightsError> {
        self.grant = resolve_all(store, &self.grant)?;
        if let Removal::Explicit(revoke) = &self.removal {
            self.removal = Removal::Explicit(resolve_all(store, revoke)?);
        }
        Ok(self)
    }
}

fn resolve_all<S: PolicyStore + ?Sized>(
    store: &S,
    principals: &BTreeSet<Principal>,
) -> Result<BTreeSet<Principal>, UserRightsError> {
    principals
        .iter()
        .map(|p| store.resolve_principal(p.as_str()))
        .collect()
}
