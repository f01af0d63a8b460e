//! Echo service declaration and operation handlers.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use callgate_types::{OperationDecl, OperationDescriptor, ServiceDecl, markers};
use entry_guard::OperationHandler;
use http::{HeaderValue, StatusCode};

/// Fully-qualified type name of the demo service.
pub const SERVICE_TYPE: &str = "demo.echo.EchoService";

/// `echo(String) -> String`, protected.
#[must_use]
pub fn echo_descriptor() -> OperationDescriptor {
    OperationDescriptor::new(SERVICE_TYPE, "echo", ["String"], "String")
}

/// `twice(String,String) -> String`, protected.
#[must_use]
pub fn twice_descriptor() -> OperationDescriptor {
    OperationDescriptor::new(SERVICE_TYPE, "twice", ["String", "String"], "String")
}

/// `ping() -> String`, public.
#[must_use]
pub fn ping_descriptor() -> OperationDescriptor {
    OperationDescriptor::new(SERVICE_TYPE, "ping", Vec::<String>::new(), "String")
}

/// The service declaration consumed by the registry builder.
#[must_use]
pub fn declaration() -> ServiceDecl {
    ServiceDecl::new(SERVICE_TYPE)
        .with_operation(OperationDecl::new(echo_descriptor()).with_marker(markers::AUTHORIZED))
        .with_operation(OperationDecl::new(twice_descriptor()).with_marker(markers::AUTHORIZED))
        .with_operation(OperationDecl::new(ping_descriptor()))
}

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> http::Response<Bytes> {
    let mut response = http::Response::new(body.into());
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain"),
    );
    response
}

fn bad_payload() -> http::Response<Bytes> {
    text_response(StatusCode::BAD_REQUEST, "payload is not valid text")
}

/// Returns the request body unchanged.
///
/// The permitted principal arrives in the propagated `user` header and is
/// mirrored back as `x-user`.
pub struct EchoHandler;

#[async_trait]
impl OperationHandler for EchoHandler {
    async fn handle(&self, request: http::Request<Bytes>) -> http::Response<Bytes> {
        let user = request.headers().get("user").cloned();
        let Ok(message) = std::str::from_utf8(request.body()) else {
            return bad_payload();
        };

        let mut response = text_response(StatusCode::OK, message.to_owned());
        if let Some(user) = user {
            response
                .headers_mut()
                .insert(http::HeaderName::from_static("x-user"), user);
        }
        response
    }
}

/// Returns the request body concatenated with itself.
pub struct TwiceHandler;

#[async_trait]
impl OperationHandler for TwiceHandler {
    async fn handle(&self, request: http::Request<Bytes>) -> http::Response<Bytes> {
        let Ok(message) = std::str::from_utf8(request.body()) else {
            return bad_payload();
        };
        text_response(StatusCode::OK, format!("{message}{message}"))
    }
}

/// Liveness probe; ignores the request entirely.
pub struct PingHandler;

#[async_trait]
impl OperationHandler for PingHandler {
    async fn handle(&self, _request: http::Request<Bytes>) -> http::Response<Bytes> {
        text_response(StatusCode::OK, "pong")
    }
}

/// One dispatchable route: where a call enters and which operation it is.
pub struct RouteSpec {
    /// HTTP method the route answers.
    pub method: http::Method,
    /// Exact request path.
    pub path: &'static str,
    /// Descriptor of the operation behind the route.
    pub descriptor: Arc<OperationDescriptor>,
    /// The operation itself.
    pub handler: Arc<dyn OperationHandler>,
}

/// Route table of the demo service.
#[must_use]
pub fn routes() -> Vec<RouteSpec> {
    vec![
        RouteSpec {
            method: http::Method::GET,
            path: "/echo",
            descriptor: Arc::new(ping_descriptor()),
            handler: Arc::new(PingHandler),
        },
        RouteSpec {
            method: http::Method::POST,
            path: "/echo",
            descriptor: Arc::new(echo_descriptor()),
            handler: Arc::new(EchoHandler),
        },
        RouteSpec {
            method: http::Method::POST,
            path: "/echo/twice",
            descriptor: Arc::new(twice_descriptor()),
            handler: Arc::new(TwiceHandler),
        },
    ]
}
