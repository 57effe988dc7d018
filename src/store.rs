use crate::entry::{Principal, Privilege};
use crate::error::UserRightsError;
use simple_error::SimpleError;
use std::collections::BTreeSet;

/// A security policy database holding user right assignments.
///
/// Implemented by [`MemoryStore`](crate::MemoryStore) and, on Windows, by `LsaStore`. Every
/// operation except `connect()` and `is_connected()` fails with
/// `UserRightsError::NotConnected` until `connect()` has succeeded.
pub trait PolicyStore {
    /// Open the policy of `host`, or of the local machine if `None`. Can only succeed once per
    /// store.
    ///
    /// # Errors
    /// * `UserRightsError::AlreadyConnected`: A previous `connect()` succeeded.
    /// * `UserRightsError::StoreError`: The store refused the connection.
    fn connect(&mut self, host: Option<&str>) -> Result<(), UserRightsError>;

    fn is_connected(&self) -> bool;

    /// All privileges currently assigned to `principal`. Unknown principals have none.
    fn privileges_of(&self, principal: &Principal) -> Result<BTreeSet<Privilege>, UserRightsError>;

    /// All principals currently holding `privilege`, or holding any privilege if `None`.
    fn principals_with(
        &self,
        privilege: Option<&Privilege>,
    ) -> Result<BTreeSet<Principal>, UserRightsError>;

    /// Assign `privileges` to `principal`.
    ///
    /// # Errors
    /// * `UserRightsError::InvalidArgument`: `privileges` is empty.
    fn grant(&mut self, principal: &Principal, privileges: &[Privilege])
        -> Result<(), UserRightsError>;

    /// Remove `privileges` from `principal`.
    ///
    /// # Errors
    /// * `UserRightsError::InvalidArgument`: `privileges` is empty.
    fn revoke(
        &mut self,
        principal: &Principal,
        privileges: &[Privilege],
    ) -> Result<(), UserRightsError>;

    /// The account name of `principal`.
    ///
    /// # Errors
    /// * `UserRightsError::TranslationError`: The principal is not known to the store's host, for
    ///   example because it belongs to a remote domain. Callers should treat this as "unknown".
    fn display_name(&self, principal: &Principal) -> Result<String, UserRightsError>;

    /// Translate account name text to a principal. Text that already is an identity is returned
    /// unchanged.
    fn resolve_principal(&self, text: &str) -> Result<Principal, UserRightsError> {
        Ok(Principal::new(text))
    }
}

/// Grant and revoke refuse an empty privilege list.
pub(crate) fn require_privileges(
    principal: &Principal,
    privileges: &[Privilege],
) -> Result<(), SimpleError> {
    if privileges.is_empty() {
        bail!("No privileges given for {}", principal);
    }
    Ok(())
}
