use crate::error::UserRightsError::*;
use simple_error::SimpleError;
use std::error::Error;
use std::io::ErrorKind;
use std::{fmt, io};

/// The store call that produced a [`UserRightsError::StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Connect,
    Enumerate,
    Grant,
    Revoke,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            StoreOp::Connect => "connecting to policy store",
            StoreOp::Enumerate => "enumerating user rights",
            StoreOp::Grant => "granting user rights",
            StoreOp::Revoke => "revoking user rights",
        })
    }
}

/// Error type from user rights operations.
#[derive(Debug)]
pub enum UserRightsError {
    /// The requested change is contradictory or incomplete. Holds every violation found.
    Validation(Vec<String>),
    /// A store operation was attempted before `connect()`.
    NotConnected,
    /// `connect()` was called on an already connected store.
    AlreadyConnected,
    /// A call was made with arguments the callee refuses, e.g. an empty privilege list.
    InvalidArgument(SimpleError),
    /// The policy store rejected an operation.
    StoreError { err: io::Error, op: StoreOp },
    /// A principal could not be translated to or from an account name.
    TranslationError { err: io::Error, principal: String },
    /// No native policy store exists on this platform.
    Unsupported,
}

impl Error for UserRightsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError { err, .. } | TranslationError { err, .. } => Some(err),
            InvalidArgument(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for UserRightsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Validation(violations) => write!(f, "Invalid request: {}", violations.join("; ")),
            NotConnected => write!(f, "Not connected to a policy store"),
            AlreadyConnected => write!(f, "Already connected to a policy store"),
            InvalidArgument(err) => write!(f, "Invalid argument: {}", err),
            StoreError { err, op } => write!(f, "Error {}: {}", op, err),
            TranslationError { err, principal } => {
                write!(f, "Error translating {}: {}", principal, err)
            }
            Unsupported => write!(f, "No policy store is available on this platform"),
        }
    }
}

impl From<SimpleError> for UserRightsError {
    fn from(err: SimpleError) -> Self {
        InvalidArgument(err)
    }
}

impl UserRightsError {
    /// Get a general category of error. Request and argument problems are returned as
    /// `InvalidInput`, connection state problems as `Other`.
    ///
    /// ```
    /// use std::io::ErrorKind;
    /// use user_rights::UserRightsError;
    /// assert_eq!(UserRightsError::Validation(vec![]).kind(), ErrorKind::InvalidInput);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Validation(_) | InvalidArgument(_) => ErrorKind::InvalidInput,
            NotConnected | AlreadyConnected => ErrorKind::Other,
            StoreError { ref err, .. } | TranslationError { ref err, .. } => err.kind(),
            Unsupported => ErrorKind::Unsupported,
        }
    }

    /// Violation messages, if this is a [`UserRightsError::Validation`] error.
    pub fn violations(&self) -> &[String] {
        match self {
            Validation(violations) => violations,
            _ => &[],
        }
    }

    pub(crate) fn store(op: StoreOp, err: io::Error) -> Self {
        StoreError { err, op }
    }
}
