use crate::entry::{Principal, UserRightEntry};
use crate::error::UserRightsError;
use crate::store::PolicyStore;
use std::io::{self, Write};
use tracing::debug;

/// Every current assignment in the store, one entry per (privilege, principal) pair.
///
/// Entries are sorted by privilege, then by principal, both case-insensitively. Principals whose
/// account name cannot be translated get an empty `account_name`. The store is only read.
///
/// # Errors
/// Any failure to enumerate the store. Translation failures are not errors.
pub fn list_assignments<S: PolicyStore + ?Sized>(
    store: &S,
) -> Result<Vec<UserRightEntry>, UserRightsError> {
    let mut entries = Vec::new();
    for principal in store.principals_with(None)? {
        let account_name = account_name(store, &principal);
        for privilege in store.privileges_of(&principal)? {
            entries.push(UserRightEntry {
                privilege,
                principal: principal.clone(),
                account_name: account_name.clone(),
            });
        }
    }
    entries.sort_by(|a, b| {
        a.privilege
            .cmp(&b.privilege)
            .then_with(|| a.principal.cmp_ignore_case(&b.principal))
    });
    Ok(entries)
}

fn account_name<S: PolicyStore + ?Sized>(store: &S, principal: &Principal) -> String {
    match store.display_name(principal) {
        Ok(name) => name,
        Err(err) => {
            debug!(%principal, "no account name: {}", err);
            String::new()
        }
    }
}

/// Write `entries` as an aligned text table with a header line.
pub fn write_table<W: Write>(mut out: W, entries: &[UserRightEntry]) -> io::Result<()> {
    const HEADERS: [&str; 3] = ["Privilege", "Principal", "Account"];
    let privilege_width = entries
        .iter()
        .map(|e| e.privilege.as_str().len())
        .fold(HEADERS[0].len(), usize::max);
    let principal_width = entries
        .iter()
        .map(|e| e.principal.as_str().len())
        .fold(HEADERS[1].len(), usize::max);

    writeln!(
        out,
        "{:<pw$}  {:<qw$}  {}",
        HEADERS[0],
        HEADERS[1],
        HEADERS[2],
        pw = privilege_width,
        qw = principal_width
    )?;
    for entry in entries {
        let line = format!(
            "{:<pw$}  {:<qw$}  {}",
            entry.privilege,
            entry.principal,
            entry.account_name,
            pw = privilege_width,
            qw = principal_width
        );
        writeln!(out, "{}", line.trim_end())?;
    }
    Ok(())
}

/// Write `entries` as a pretty-printed JSON array.
pub fn write_json<W: Write>(mut out: W, entries: &[UserRightEntry]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, entries)?;
    writeln!(out)
}
