//! user-rights manages the assignment of user rights (LSA account privileges such as
//! `SeServiceLogonRight`) to security principals.
//!
//! Changes are described with [`PrincipalChange`] or [`PrivilegeChange`], validated into a
//! [`PrincipalRequest`] or [`PrivilegeRequest`], and then reconciled against a [`PolicyStore`]
//! with [`reconcile_principal()`] or [`reconcile_privilege()`]. [`list_assignments()`] reports
//! every current assignment.
//!
//! ```
//! use user_rights::{reconcile_principal, MemoryStore, PolicyStore, PrincipalChange};
//! let mut store = MemoryStore::new().with_assignment("S-1-5-20", "SeBatchLogonRight");
//! store.connect(None).unwrap();
//!
//! let request = PrincipalChange {
//!     principal: "S-1-5-20".into(),
//!     grant: vec!["SeServiceLogonRight".into()],
//!     revoke_others: true,
//!     ..Default::default()
//! }
//! .into_request()
//! .unwrap();
//! let actions = reconcile_principal(&mut store, &request).unwrap();
//! assert_eq!(actions[0].to_string(), "revoke SeBatchLogonRight from S-1-5-20");
//! assert_eq!(actions[1].to_string(), "grant SeServiceLogonRight to S-1-5-20");
//! ```
#[macro_use]
extern crate simple_error;

mod entry;
mod error;
#[cfg(windows)]
mod iter;
mod listing;
#[cfg(windows)]
mod lsa;
mod memory;
mod pattern;
mod reconcile;
mod request;
mod store;
#[cfg(windows)]
mod util;
mod validate;

pub use entry::{Principal, Privilege, UserRightEntry};
pub use error::{StoreOp, UserRightsError};
pub use listing::{list_assignments, write_json, write_table};
#[cfg(windows)]
pub use lsa::LsaStore;
pub use memory::MemoryStore;
pub use pattern::{RevokePattern, PATTERN_TIMEOUT};
pub use reconcile::{
    apply, plan_principal, plan_privilege, reconcile_principal, reconcile_privilege, Action, Op,
};
pub use request::{
    PrincipalChange, PrincipalRequest, PrivilegeChange, PrivilegeRequest, Removal,
};
pub use store::PolicyStore;
pub use validate::{validate_principal_change, validate_privilege_change};

#[cfg(test)]
mod tests;
