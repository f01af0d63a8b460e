//! Normalized per-call request view.

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::error::AdapterError;
use crate::outcome::AuthzOutcome;

/// Normalized view of an intercepted call, handed to authorization filters.
///
/// The view exposes header lookup by name, header mutation (mutations on an
/// allowed call are propagated to the request the chain continues with) and
/// an abort signal. It is exclusively owned by the call that created it and
/// is discarded once the call completes or aborts.
#[derive(Debug)]
pub struct RequestView {
    path: String,
    headers: HeaderMap,
    abort: Option<(StatusCode, String)>,
}

impl RequestView {
    /// Build a view over the call's path and a snapshot of its headers.
    #[must_use]
    pub fn new(path: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            path: path.into(),
            headers,
            abort: None,
        }
    }

    /// Request path of the intercepted call.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Look up a header value as text.
    ///
    /// Returns `Ok(None)` when the header is absent.
    ///
    /// # Errors
    ///
    /// [`AdapterError::InvalidEncoding`] when the header exists but its
    /// value is not representable as text; the absence of a value must not
    /// be conflated with an undecodable one.
    pub fn header(&self, name: &HeaderName) -> Result<Option<&str>, AdapterError> {
        match self.headers.get(name) {
            None => Ok(None),
            Some(value) => value
                .to_str()
                .map(Some)
                .map_err(|_| AdapterError::InvalidEncoding {
                    name: name.as_str().to_owned(),
                }),
        }
    }

    /// Set a header on the view.
    ///
    /// On an allowed call the mutated headers are written back into the
    /// propagated request.
    ///
    /// # Errors
    ///
    /// [`AdapterError::InvalidEncoding`] when `value` contains characters
    /// that cannot be carried in a header.
    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<(), AdapterError> {
        let value = HeaderValue::from_str(value).map_err(|_| AdapterError::InvalidEncoding {
            name: name.as_str().to_owned(),
        })?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Abort the call with the given status and message.
    ///
    /// A later abort replaces an earlier one; the last signal wins.
    pub fn abort(&mut self, status: StatusCode, message: impl Into<String>) {
        self.abort = Some((status, message.into()));
    }

    /// Whether an abort has been signalled.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.abort.is_some()
    }

    /// Consume the view into its outcome and (possibly mutated) headers.
    #[must_use]
    pub fn into_outcome(self) -> (AuthzOutcome, HeaderMap) {
        let outcome = match self.abort {
            Some((status, message)) => AuthzOutcome::Abort { status, message },
            None => AuthzOutcome::Allow,
        };
        (outcome, self.headers)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::header::AUTHORIZATION;

    fn view_with_auth(value: &[u8]) -> RequestView {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_bytes(value).unwrap());
        RequestView::new("/echo", headers)
    }

    #[test]
    fn header_lookup() {
        let view = view_with_auth(b"helidon");
        assert_eq!(view.header(&AUTHORIZATION).unwrap(), Some("helidon"));
        assert_eq!(
            view.header(&HeaderName::from_static("user")).unwrap(),
            None
        );
    }

    #[test]
    fn undecodable_header_is_an_error_not_none() {
        let view = view_with_auth(&[0xff, 0xfe]);
        let err = view.header(&AUTHORIZATION).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidEncoding { .. }));
    }

    #[test]
    fn set_header_propagates_through_outcome() {
        let mut view = view_with_auth(b"helidon");
        view.set_header(HeaderName::from_static("user"), "helidon")
            .unwrap();

        let (outcome, headers) = view.into_outcome();
        assert_eq!(outcome, AuthzOutcome::Allow);
        assert_eq!(headers.get("user").unwrap(), "helidon");
    }

    #[test]
    fn abort_wins_over_allow() {
        let mut view = view_with_auth(b"foo");
        view.abort(StatusCode::UNAUTHORIZED, "");
        assert!(view.is_aborted());

        let (outcome, _) = view.into_outcome();
        assert_eq!(outcome, AuthzOutcome::abort(StatusCode::UNAUTHORIZED, ""));
    }

    #[test]
    fn last_abort_signal_wins() {
        let mut view = view_with_auth(b"foo");
        view.abort(StatusCode::UNAUTHORIZED, "");
        view.abort(StatusCode::FORBIDDEN, "nope");

        let (outcome, _) = view.into_outcome();
        assert_eq!(outcome, AuthzOutcome::abort(StatusCode::FORBIDDEN, "nope"));
    }
}
