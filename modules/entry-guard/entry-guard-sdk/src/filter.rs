//! Authorization filter plugin boundary.

use async_trait::async_trait;

use crate::error::FilterError;
use crate::view::RequestView;

/// Pluggable authorization policy.
///
/// A filter receives the normalized [`RequestView`] of an intercepted call.
/// It either calls [`RequestView::abort`] on the view, or returns normally
/// to allow the call. Returning an error is treated by the enforcement step
/// as a server failure and aborts the call with status 500; it is never an
/// implicit allow.
///
/// Filters are constructed once and shared across calls, so implementations
/// must not retain per-call state. A filter that consults a remote policy
/// service must bound that call with a timeout and fail closed (see
/// `TimeboxedFilter` in the `entry-guard` crate).
#[async_trait]
pub trait AuthorizationFilter: Send + Sync {
    /// Evaluate the policy for one call.
    ///
    /// # Errors
    ///
    /// Any [`FilterError`] aborts the call with status 500.
    async fn filter(&self, view: &mut RequestView) -> Result<(), FilterError>;
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::sync::Arc;

    use http::{HeaderMap, StatusCode};

    use crate::outcome::AuthzOutcome;

    struct DenyAll;

    #[async_trait]
    impl AuthorizationFilter for DenyAll {
        async fn filter(&self, view: &mut RequestView) -> Result<(), FilterError> {
            view.abort(StatusCode::FORBIDDEN, "denied");
            Ok(())
        }
    }

    #[tokio::test]
    async fn filters_are_object_safe() {
        let filter: Arc<dyn AuthorizationFilter> = Arc::new(DenyAll);
        let mut view = RequestView::new("/echo", HeaderMap::new());

        filter.filter(&mut view).await.unwrap();

        let (outcome, _) = view.into_outcome();
        assert_eq!(outcome, AuthzOutcome::abort(StatusCode::FORBIDDEN, "denied"));
    }
}
