//! Error types for the entry-guard contracts.

/// Error raised when a per-call adapter is asked for something it cannot
/// provide.
///
/// These are surfaced to the caller; swallowing one and continuing is a
/// defect in the adapter's consumer.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The adapter does not support the requested capability.
    #[error("unsupported capability: {0}")]
    UnsupportedCapability(&'static str),

    /// A value exists but is not representable as text.
    #[error("value of '{name}' is not valid text")]
    InvalidEncoding {
        /// Name of the header or part that failed to decode.
        name: String,
    },
}

/// Error raised by an [`AuthorizationFilter`](crate::AuthorizationFilter)
/// implementation.
///
/// A filter error is a server failure, never an implicit allow: the
/// enforcement step maps every variant to an abort with status 500.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// A dependency of the filter (e.g. a remote policy service) is down.
    #[error("filter dependency unavailable: {0}")]
    Unavailable(String),

    /// Filter evaluation exceeded its bounded timeout.
    #[error("filter evaluation timed out")]
    Timeout,

    /// The filter could not read the call it was given.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Unexpected filter failure.
    #[error("filter internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stable() {
        let err = AdapterError::UnsupportedCapability("trailers");
        assert_eq!(err.to_string(), "unsupported capability: trailers");

        let err = FilterError::Timeout;
        assert_eq!(err.to_string(), "filter evaluation timed out");

        let err = FilterError::from(AdapterError::InvalidEncoding {
            name: "authorization".to_owned(),
        });
        assert_eq!(err.to_string(), "value of 'authorization' is not valid text");
    }
}
