//! Operation guards.
//!
//! An [`OperationGuard`] is one generated chain link: it decides whether the
//! current call targets one of its indexed protected operations and, on a
//! hit, runs the policy enforcement step. On a miss it forwards the call
//! untouched.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use callgate_types::OperationDescriptor;
use entry_guard_sdk::AuthzOutcome;
use http::StatusCode;

use crate::chain::{Chain, EntryInterceptor, InterceptedCall};
use crate::policy::PolicyEnforcement;

/// What a guard matches against.
///
/// The match is always a pure comparison of the call's owner + signature;
/// the variants only trade generated-artifact count against lookup shape.
#[derive(Debug, Clone)]
pub enum MatchIndex {
    /// Exactly one protected operation.
    Single {
        /// The guarded operation.
        descriptor: Arc<OperationDescriptor>,
    },
    /// Every protected operation of one namespace, keyed by the
    /// precomputed `owner::signature` string.
    Namespace {
        /// The namespace this guard consolidates.
        namespace: String,
        /// Qualified keys of all guarded operations in the namespace.
        keys: HashSet<String>,
    },
}

impl MatchIndex {
    fn matches(&self, descriptor: &OperationDescriptor) -> bool {
        match self {
            Self::Single { descriptor: own } => own.as_ref() == descriptor,
            Self::Namespace { keys, .. } => keys.contains(descriptor.qualified_key()),
        }
    }

    /// Number of operations this index covers.
    #[must_use]
    pub fn coverage(&self) -> usize {
        match self {
            Self::Single { .. } => 1,
            Self::Namespace { keys, .. } => keys.len(),
        }
    }
}

/// A generated interception unit guarding one or more protected operations.
///
/// Built once by the registry builder, read-only afterwards; a single
/// instance serves every call that could match its scope.
pub struct OperationGuard {
    name: String,
    index: MatchIndex,
    enforcement: PolicyEnforcement,
}

impl OperationGuard {
    pub(crate) fn new(name: String, index: MatchIndex, enforcement: PolicyEnforcement) -> Self {
        Self {
            name,
            index,
            enforcement,
        }
    }

    /// Generated name of this guard, unique within its registry.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The guard's match index.
    #[must_use]
    pub fn index(&self) -> &MatchIndex {
        &self.index
    }

    /// Whether a call with this descriptor is guarded by this unit.
    ///
    /// Pure and side-effect free; evaluating it twice for the same
    /// descriptor yields the same result.
    #[must_use]
    pub fn matches(&self, descriptor: &OperationDescriptor) -> bool {
        self.index.matches(descriptor)
    }
}

impl std::fmt::Debug for OperationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationGuard")
            .field("name", &self.name)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EntryInterceptor for OperationGuard {
    async fn intercept(
        &self,
        mut call: InterceptedCall,
        chain: Chain<'_>,
    ) -> http::Response<Bytes> {
        if !self.matches(call.descriptor()) {
            return chain.proceed(call).await;
        }

        tracing::debug!(
            guard = %self.name,
            operation = %call.descriptor(),
            "enforcing authorization for protected operation"
        );

        match self.enforcement.enforce(&mut call).await {
            AuthzOutcome::Allow => chain.proceed(call).await,
            AuthzOutcome::Abort { status, message } => rejection(status, message),
        }
    }
}

/// Build the rejection response for an aborted call.
///
/// An empty message becomes an empty body.
fn rejection(status: StatusCode, message: String) -> http::Response<Bytes> {
    let mut response = http::Response::new(Bytes::from(message));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use entry_guard_sdk::{AuthorizationFilter, FilterError, RequestView};

    use crate::chain::OperationHandler;

    fn echo_descriptor() -> Arc<OperationDescriptor> {
        Arc::new(OperationDescriptor::new(
            "demo.echo.EchoService",
            "echo",
            ["String"],
            "String",
        ))
    }

    fn ping_descriptor() -> Arc<OperationDescriptor> {
        Arc::new(OperationDescriptor::new(
            "demo.echo.EchoService",
            "ping",
            Vec::<String>::new(),
            "String",
        ))
    }

    /// Counts evaluations; allows or rejects according to `allow`.
    struct CountingFilter {
        evaluations: Arc<AtomicUsize>,
        allow: bool,
    }

    #[async_trait]
    impl AuthorizationFilter for CountingFilter {
        async fn filter(&self, view: &mut RequestView) -> Result<(), FilterError> {
            self.evaluations.fetch_add(1, Ordering::SeqCst);
            if !self.allow {
                view.abort(StatusCode::UNAUTHORIZED, "");
            }
            Ok(())
        }
    }

    /// Counts how many calls reach the real operation.
    struct CountingTerminal {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl OperationHandler for CountingTerminal {
        async fn handle(&self, request: http::Request<Bytes>) -> http::Response<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            http::Response::new(request.into_body())
        }
    }

    struct Harness {
        guard: Arc<OperationGuard>,
        evaluations: Arc<AtomicUsize>,
        calls: Arc<AtomicUsize>,
        terminal: CountingTerminal,
    }

    fn harness(allow: bool) -> Harness {
        let evaluations = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let filter = CountingFilter {
            evaluations: evaluations.clone(),
            allow,
        };
        let guard = Arc::new(OperationGuard::new(
            "demo_echo_EchoService_echo__Authorized".to_owned(),
            MatchIndex::Single {
                descriptor: echo_descriptor(),
            },
            PolicyEnforcement::new(Arc::new(filter)),
        ));
        Harness {
            guard,
            evaluations,
            calls: calls.clone(),
            terminal: CountingTerminal { calls },
        }
    }

    fn call_for(descriptor: Arc<OperationDescriptor>) -> InterceptedCall {
        InterceptedCall::new(descriptor, http::Request::new(Bytes::from("hello")))
    }

    #[test]
    fn matching_is_idempotent() {
        let h = harness(true);
        let echo = echo_descriptor();
        let ping = ping_descriptor();

        assert_eq!(h.guard.matches(&echo), h.guard.matches(&echo));
        assert!(h.guard.matches(&echo));
        assert!(!h.guard.matches(&ping));
        assert!(!h.guard.matches(&ping));
    }

    #[test]
    fn namespace_index_matches_by_qualified_key() {
        let echo = echo_descriptor();
        let ping = ping_descriptor();
        let index = MatchIndex::Namespace {
            namespace: "demo.echo".to_owned(),
            keys: HashSet::from([echo.qualified_key().to_owned()]),
        };

        assert!(index.matches(&echo));
        assert!(!index.matches(&ping));
        assert_eq!(index.coverage(), 1);
    }

    #[tokio::test]
    async fn allowed_call_runs_filter_and_operation_exactly_once() {
        let h = harness(true);
        let links: Vec<Arc<dyn EntryInterceptor>> = vec![h.guard.clone()];

        let response = Chain::new(&links, &h.terminal)
            .proceed(call_for(echo_descriptor()))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.evaluations.load(Ordering::SeqCst), 1);
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_call_never_reaches_the_operation() {
        let h = harness(false);
        let links: Vec<Arc<dyn EntryInterceptor>> = vec![h.guard.clone()];

        let response = Chain::new(&links, &h.terminal)
            .proceed(call_for(echo_descriptor()))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.into_body(), Bytes::new());
        assert_eq!(h.evaluations.load(Ordering::SeqCst), 1);
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unguarded_call_passes_through_without_enforcement() {
        let h = harness(false);
        let links: Vec<Arc<dyn EntryInterceptor>> = vec![h.guard.clone()];

        let response = Chain::new(&links, &h.terminal)
            .proceed(call_for(ping_descriptor()))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.evaluations.load(Ordering::SeqCst), 0);
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn abort_stops_later_links() {
        let h = harness(false);
        let tail_evaluations = Arc::new(AtomicUsize::new(0));
        let tail = Arc::new(OperationGuard::new(
            "tail__Authorized".to_owned(),
            MatchIndex::Single {
                descriptor: echo_descriptor(),
            },
            PolicyEnforcement::new(Arc::new(CountingFilter {
                evaluations: tail_evaluations.clone(),
                allow: true,
            })),
        ));
        let links: Vec<Arc<dyn EntryInterceptor>> = vec![h.guard.clone(), tail];

        let response = Chain::new(&links, &h.terminal)
            .proceed(call_for(echo_descriptor()))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(tail_evaluations.load(Ordering::SeqCst), 0);
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }
}
