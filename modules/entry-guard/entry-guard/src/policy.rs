//! Policy enforcement step.
//!
//! [`PolicyEnforcement`] adapts an intercepted call into the normalized
//! [`RequestView`], runs the configured authorization filter against it and
//! interprets the result as an [`AuthzOutcome`].
//!
//! The filter is constructed once during registry build and shared by every
//! guard; nothing is instantiated per call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use entry_guard_sdk::{AuthorizationFilter, AuthzOutcome, FilterError, RequestView};
use http::StatusCode;

use crate::chain::InterceptedCall;

/// Runs the authorization filter for one matched call.
///
/// Cheap to clone (`Arc` inside); every guard of a registry carries one.
#[derive(Clone)]
pub struct PolicyEnforcement {
    filter: Arc<dyn AuthorizationFilter>,
}

impl PolicyEnforcement {
    /// Wrap the given filter.
    #[must_use]
    pub fn new(filter: Arc<dyn AuthorizationFilter>) -> Self {
        Self { filter }
    }

    /// Evaluate the filter against `call` and interpret the outcome.
    ///
    /// - the filter aborted the view: that abort is returned verbatim
    /// - the filter returned normally: `Allow`, and header mutations the
    ///   filter made on the view are written back into the propagated
    ///   request
    /// - the filter failed: `Abort(500, diagnostic)` — a filter failure is
    ///   a server failure, never an implicit allow
    pub async fn enforce(&self, call: &mut InterceptedCall) -> AuthzOutcome {
        let mut view = RequestView::new(
            call.request().uri().path(),
            call.request().headers().clone(),
        );

        if let Err(error) = self.filter.filter(&mut view).await {
            tracing::error!(
                operation = %call.descriptor(),
                error = %error,
                "authorization filter failed; rejecting call"
            );
            return AuthzOutcome::abort(StatusCode::INTERNAL_SERVER_ERROR, error.to_string());
        }

        let (outcome, headers) = view.into_outcome();
        if outcome == AuthzOutcome::Allow {
            *call.request_mut().headers_mut() = headers;
        }
        outcome
    }
}

impl std::fmt::Debug for PolicyEnforcement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEnforcement").finish_non_exhaustive()
    }
}

/// Bounds an inner filter with a timeout, failing closed.
///
/// A filter that consults a remote policy service can hang; wrapping it in
/// a `TimeboxedFilter` converts an elapsed deadline into
/// [`FilterError::Timeout`], which the enforcement step maps to an abort.
pub struct TimeboxedFilter<F> {
    inner: F,
    limit: Duration,
}

impl<F> TimeboxedFilter<F> {
    /// Bound `inner` to `limit` per evaluation.
    #[must_use]
    pub fn new(inner: F, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl<F: AuthorizationFilter> AuthorizationFilter for TimeboxedFilter<F> {
    async fn filter(&self, view: &mut RequestView) -> Result<(), FilterError> {
        tokio::time::timeout(self.limit, self.inner.filter(view))
            .await
            .map_err(|_| FilterError::Timeout)?
    }
}
