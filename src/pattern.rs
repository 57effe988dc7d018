use crate::entry::Principal;
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// How long compiling a revoke pattern may take before it is rejected.
pub const PATTERN_TIMEOUT: Duration = Duration::from_secs(1);

/// Upper bound on the compiled program size of a revoke pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// A regular expression matched against principal identity text, e.g. `^S-1-5-21-.*-1[0-9]{3}$`.
///
/// Matching runs in time linear in the input, so only compilation needs a deadline. Compilation
/// happens on a helper thread that is abandoned once [`PATTERN_TIMEOUT`] expires.
#[derive(Clone)]
pub struct RevokePattern {
    regex: Regex,
}

impl RevokePattern {
    /// Compile `expr`, giving up after [`PATTERN_TIMEOUT`].
    ///
    /// # Errors
    /// A message describing the syntax error, size limit or timeout.
    pub fn new(expr: &str) -> Result<RevokePattern, String> {
        Self::with_timeout(expr, PATTERN_TIMEOUT)
    }

    /// Compile `expr`, giving up after `timeout`.
    ///
    /// A compilation that times out is not cancelled: its thread keeps running in the background
    /// until the regex builder returns, which the size limit bounds.
    ///
    /// # Errors
    /// As for [`RevokePattern::new()`].
    pub fn with_timeout(expr: &str, timeout: Duration) -> Result<RevokePattern, String> {
        let (tx, rx) = mpsc::channel();
        let owned = expr.to_string();
        thread::spawn(move || {
            let compiled = RegexBuilder::new(&owned)
                .size_limit(PATTERN_SIZE_LIMIT)
                .dfa_size_limit(PATTERN_SIZE_LIMIT)
                .build();
            // Receiver is gone if we timed out.
            let _ = tx.send(compiled);
        });
        match rx.recv_timeout(timeout) {
            Ok(Ok(regex)) => Ok(RevokePattern { regex }),
            Ok(Err(err)) => Err(err.to_string()),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(format!(
                "evaluation timed out after {} ms",
                timeout.as_millis()
            )),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err("pattern compilation aborted".to_string())
            }
        }
    }

    pub fn is_match(&self, principal: &Principal) -> bool {
        self.regex.is_match(principal.as_str())
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl fmt::Debug for RevokePattern {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_tuple("RevokePattern").field(&self.as_str()).finish()
    }
}

impl PartialEq for RevokePattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}
