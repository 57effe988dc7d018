use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The holder of a user right: an opaque, stable identity such as a SID string (`S-1-5-32-544`).
///
/// Equality is on the identity text itself. Account names are not part of the identity, see
/// [`PolicyStore::display_name()`](crate::PolicyStore::display_name). SID strings are stored in
/// the form the system prints them, so `s-1-5-20` and `S-1-5-20` are the same principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Principal(String);

impl Principal {
    /// Surrounding whitespace is removed and SID strings are canonicalized.
    pub fn new<S: AsRef<str>>(id: S) -> Principal {
        let id = id.as_ref().trim();
        if is_sid_text(id) {
            Principal(canonical_sid(id))
        } else {
            Principal(id.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this looks like a SID string rather than an account name.
    pub fn is_sid(&self) -> bool {
        is_sid_text(&self.0)
    }

    /// Case-insensitive ordering, used when sorting listings.
    pub fn cmp_ignore_case(&self, other: &Principal) -> Ordering {
        self.0.to_lowercase().cmp(&other.0.to_lowercase())
    }
}

/// `S-1-` followed by hyphen-separated numbers, case-insensitively. Authorities may be hex.
fn is_sid_text(text: &str) -> bool {
    match text.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("S-1-") => text[4..]
            .split('-')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_alphanumeric())),
        _ => false,
    }
}

/// Uppercase `S` and hex digits, lowercase `0x`, as `ConvertSidToStringSidW` prints them.
fn canonical_sid(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'x' | 'X' => 'x',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(id: &str) -> Self {
        Principal::new(id)
    }
}

/// A named user right, e.g. `SeServiceLogonRight`.
///
/// The token is case-insensitive: `SeDebugPrivilege` and `sedebugprivilege` are the same
/// privilege. The original spelling is kept for display.
#[derive(Debug, Clone)]
pub struct Privilege {
    name: String,
    folded: String,
}

impl Privilege {
    pub fn new<S: AsRef<str>>(name: S) -> Privilege {
        let name = name.as_ref().trim().to_string();
        let folded = name.to_lowercase();
        Privilege { name, folded }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Privilege {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for Privilege {}

impl Hash for Privilege {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

impl PartialOrd for Privilege {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Privilege {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded.cmp(&other.folded)
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.name)
    }
}

impl From<&str> for Privilege {
    fn from(name: &str) -> Self {
        Privilege::new(name)
    }
}

/// One assignment of a privilege to a principal, returned from
/// [`list_assignments()`](crate::list_assignments).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRightEntry {
    #[serde(serialize_with = "serialize_display")]
    pub privilege: Privilege,
    #[serde(serialize_with = "serialize_display")]
    pub principal: Principal,
    /// `DOMAIN\name` when the principal could be translated, otherwise empty.
    pub account_name: String,
}

fn serialize_display<T: fmt::Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
