//! Request dispatch through the interception chain.

use std::sync::Arc;

use bytes::Bytes;
use entry_guard::{
    Chain, EntryInterceptor, GuardRegistry, GuardRegistryBuilder, IndexStrategy, InterceptedCall,
    RegistryBuildError,
};
use entry_guard_sdk::AuthorizationFilter;
use http::StatusCode;
use secrecy::SecretString;
use shared_secret_filter::SharedSecretFilter;

use crate::service::{self, RouteSpec};

/// The assembled demo application: route table plus guard chain.
///
/// Built once at startup; `dispatch` is safe to call from any number of
/// concurrent tasks.
pub struct EchoApp {
    registry: GuardRegistry,
    interceptors: Vec<Arc<dyn EntryInterceptor>>,
    routes: Vec<RouteSpec>,
}

impl EchoApp {
    /// Assemble the app with the given strategy and authorization filter.
    ///
    /// # Errors
    ///
    /// [`RegistryBuildError`] when the service declaration cannot be turned
    /// into a registry.
    pub fn build(
        strategy: IndexStrategy,
        filter: Arc<dyn AuthorizationFilter>,
    ) -> Result<Self, RegistryBuildError> {
        let registry = GuardRegistryBuilder::new(filter)
            .with_strategy(strategy)
            .build(&[service::declaration()])?;
        let interceptors = registry.interceptors();

        Ok(Self {
            registry,
            interceptors,
            routes: service::routes(),
        })
    }

    /// Assemble the app with the reference shared-secret filter.
    ///
    /// # Errors
    ///
    /// [`RegistryBuildError`] when the service declaration cannot be turned
    /// into a registry.
    pub fn with_shared_secret(
        strategy: IndexStrategy,
        token: SecretString,
    ) -> Result<Self, RegistryBuildError> {
        Self::build(strategy, Arc::new(SharedSecretFilter::new(token)))
    }

    /// The guard registry backing this app.
    #[must_use]
    pub fn registry(&self) -> &GuardRegistry {
        &self.registry
    }

    /// Route a request to its operation through the guard chain.
    ///
    /// Unknown routes answer 404 without entering the chain; there is no
    /// operation to guard.
    pub async fn dispatch(&self, request: http::Request<Bytes>) -> http::Response<Bytes> {
        let route = self.routes.iter().find(|route| {
            &route.method == request.method() && route.path == request.uri().path()
        });

        let Some(route) = route else {
            tracing::debug!(
                method = %request.method(),
                path = request.uri().path(),
                "no such operation"
            );
            let mut response = http::Response::new(Bytes::new());
            *response.status_mut() = StatusCode::NOT_FOUND;
            return response;
        };

        let call = InterceptedCall::new(route.descriptor.clone(), request);
        Chain::new(&self.interceptors, route.handler.as_ref())
            .proceed(call)
            .await
    }
}

impl std::fmt::Debug for EchoApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EchoApp")
            .field("registry", &self.registry)
            .field("routes", &self.routes.len())
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn app() -> EchoApp {
        EchoApp::with_shared_secret(
            IndexStrategy::default(),
            SecretString::from("helidon".to_owned()),
        )
        .unwrap()
    }

    fn get(path: &str) -> http::Request<Bytes> {
        let mut request = http::Request::new(Bytes::new());
        *request.uri_mut() = path.parse().unwrap();
        request
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = app().dispatch(get("/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ping_does_not_require_a_token() {
        let response = app().dispatch(get("/echo")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.into_body(), Bytes::from("pong"));
    }
}
