use crate::entry::{Principal, Privilege};
use crate::error::{StoreOp, UserRightsError};
use crate::reconcile::{Action, Op};
use crate::store::{require_privileges, PolicyStore};
use std::collections::{BTreeMap, BTreeSet};
use std::io;

/// An in-process [`PolicyStore`], for tests and dry experiments.
///
/// Supports failure injection with [`MemoryStore::fail_on()`] and records every successful
/// grant or revoke, one [`Action`] per privilege, see [`MemoryStore::calls()`].
///
/// ```
/// use user_rights::{MemoryStore, PolicyStore, Principal, Privilege};
/// let mut store = MemoryStore::new()
///     .with_assignment("S-1-5-20", "SeServiceLogonRight")
///     .with_name("S-1-5-20", "NT AUTHORITY\\NETWORK SERVICE");
/// store.connect(None).unwrap();
/// let rights = store.privileges_of(&Principal::new("S-1-5-20")).unwrap();
/// assert!(rights.contains(&Privilege::new("seservicelogonright")));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    connected: bool,
    host: Option<String>,
    assignments: BTreeMap<Principal, BTreeSet<Privilege>>,
    names: BTreeMap<Principal, String>,
    failures: Vec<(StoreOp, Principal, Option<Privilege>)>,
    calls: Vec<Action>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// Start with `principal` holding `privilege`.
    #[must_use]
    pub fn with_assignment(mut self, principal: &str, privilege: &str) -> MemoryStore {
        self.assignments
            .entry(Principal::new(principal))
            .or_default()
            .insert(Privilege::new(privilege));
        self
    }

    /// Make `principal` translatable to the account name `name`.
    #[must_use]
    pub fn with_name(mut self, principal: &str, name: &str) -> MemoryStore {
        self.names.insert(Principal::new(principal), name.to_string());
        self
    }

    /// Make `op` fail for `principal`; for grant and revoke only when the call includes
    /// `privilege`, if given.
    #[must_use]
    pub fn fail_on(mut self, op: StoreOp, principal: &str, privilege: Option<&str>) -> MemoryStore {
        self.failures
            .push((op, Principal::new(principal), privilege.map(Privilege::new)));
        self
    }

    /// Successful mutating calls so far, in order.
    pub fn calls(&self) -> &[Action] {
        &self.calls
    }

    /// The host passed to `connect()`.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Every current assignment as `(principal, privilege)` pairs.
    pub fn assignments(&self) -> BTreeSet<(Principal, Privilege)> {
        self.assignments
            .iter()
            .flat_map(|(principal, privileges)| {
                privileges
                    .iter()
                    .map(move |privilege| (principal.clone(), privilege.clone()))
            })
            .collect()
    }

    fn check_connected(&self) -> Result<(), UserRightsError> {
        if self.connected {
            Ok(())
        } else {
            Err(UserRightsError::NotConnected)
        }
    }

    fn check_failure(
        &self,
        op: StoreOp,
        principal: &Principal,
        privileges: &[Privilege],
    ) -> Result<(), UserRightsError> {
        let hit = self.failures.iter().any(|(f_op, f_principal, f_privilege)| {
            *f_op == op
                && f_principal == principal
                && f_privilege.as_ref().map_or(true, |p| privileges.contains(p))
        });
        if hit {
            let err = io::Error::new(io::ErrorKind::PermissionDenied, "Access is denied.");
            return Err(UserRightsError::store(op, err));
        }
        Ok(())
    }
}

impl PolicyStore for MemoryStore {
    fn connect(&mut self, host: Option<&str>) -> Result<(), UserRightsError> {
        if self.connected {
            return Err(UserRightsError::AlreadyConnected);
        }
        self.host = host.map(str::to_string);
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn privileges_of(&self, principal: &Principal) -> Result<BTreeSet<Privilege>, UserRightsError> {
        self.check_connected()?;
        self.check_failure(StoreOp::Enumerate, principal, &[])?;
        Ok(self.assignments.get(principal).cloned().unwrap_or_default())
    }

    fn principals_with(
        &self,
        privilege: Option<&Privilege>,
    ) -> Result<BTreeSet<Principal>, UserRightsError> {
        self.check_connected()?;
        Ok(self
            .assignments
            .iter()
            .filter(|(_, privileges)| match privilege {
                Some(privilege) => privileges.contains(privilege),
                None => !privileges.is_empty(),
            })
            .map(|(principal, _)| principal.clone())
            .collect())
    }

    fn grant(
        &mut self,
        principal: &Principal,
        privileges: &[Privilege],
    ) -> Result<(), UserRightsError> {
        self.check_connected()?;
        require_privileges(principal, privileges)?;
        self.check_failure(StoreOp::Grant, principal, privileges)?;
        let held = self.assignments.entry(principal.clone()).or_default();
        for privilege in privileges {
            held.insert(privilege.clone());
            self.calls.push(Action::new(Op::Grant, principal, privilege));
        }
        Ok(())
    }

    fn revoke(
        &mut self,
        principal: &Principal,
        privileges: &[Privilege],
    ) -> Result<(), UserRightsError> {
        self.check_connected()?;
        require_privileges(principal, privileges)?;
        self.check_failure(StoreOp::Revoke, principal, privileges)?;
        if let Some(held) = self.assignments.get_mut(principal) {
            for privilege in privileges {
                held.remove(privilege);
            }
            if held.is_empty() {
                self.assignments.remove(principal);
            }
        }
        for privilege in privileges {
            self.calls.push(Action::new(Op::Revoke, principal, privilege));
        }
        Ok(())
    }

    fn display_name(&self, principal: &Principal) -> Result<String, UserRightsError> {
        self.check_connected()?;
        self.names
            .get(principal)
            .cloned()
            .ok_or_else(|| UserRightsError::TranslationError {
                err: io::Error::new(
                    io::ErrorKind::NotFound,
                    "No mapping between account names and security IDs was done.",
                ),
                principal: principal.to_string(),
            })
    }

    fn resolve_principal(&self, text: &str) -> Result<Principal, UserRightsError> {
        let text = text.trim();
        let known = self
            .names
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(text));
        Ok(match known {
            Some((principal, _)) => principal.clone(),
            None => Principal::new(text),
        })
    }
}
