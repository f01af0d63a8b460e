//! Authorization outcomes.

use http::StatusCode;

/// Result of one policy enforcement run.
///
/// There are exactly two outcomes and no intermediate states: either the
/// call is allowed to continue down the chain, or it is aborted with a
/// status code and message. An empty message becomes an empty response
/// body, not an absent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzOutcome {
    /// The call may proceed to the next chain link.
    Allow,
    /// The call terminates here with the given rejection response.
    Abort {
        /// Response status to write.
        status: StatusCode,
        /// Response body; may be empty.
        message: String,
    },
}

impl AuthzOutcome {
    /// Abort with a status and message.
    #[must_use]
    pub fn abort(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Abort {
            status,
            message: message.into(),
        }
    }

    /// Whether this outcome aborts the call.
    #[must_use]
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort { .. })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn abort_constructor() {
        let outcome = AuthzOutcome::abort(StatusCode::UNAUTHORIZED, "");
        assert!(outcome.is_abort());
        assert_eq!(
            outcome,
            AuthzOutcome::Abort {
                status: StatusCode::UNAUTHORIZED,
                message: String::new(),
            }
        );
    }

    #[test]
    fn allow_is_not_abort() {
        assert!(!AuthzOutcome::Allow.is_abort());
    }
}
