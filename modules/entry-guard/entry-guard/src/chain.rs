//! Interception chain.
//!
//! A [`Chain`] is the ordered sequence of interceptors a call travels
//! through before the real operation runs. Every link receives the call and
//! the remaining chain by value: a link either returns a response of its own
//! (abort) or hands both onwards via [`Chain::proceed`] exactly once.
//! Proceeding twice or dropping a call silently is unrepresentable; the
//! handle is consumed and a response must be returned.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use callgate_types::OperationDescriptor;
use entry_guard_sdk::AdapterError;

/// Per-call bundle: the dynamic descriptor of the operation being invoked
/// plus the inbound request.
///
/// Created when a call enters the chain, exclusively owned by that call and
/// discarded when it completes or aborts.
#[derive(Debug)]
pub struct InterceptedCall {
    descriptor: Arc<OperationDescriptor>,
    request: http::Request<Bytes>,
}

impl InterceptedCall {
    /// Bundle a request with the descriptor of the operation it targets.
    #[must_use]
    pub fn new(descriptor: Arc<OperationDescriptor>, request: http::Request<Bytes>) -> Self {
        Self {
            descriptor,
            request,
        }
    }

    /// Descriptor of the operation actually being called.
    #[must_use]
    pub fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    /// The inbound request.
    #[must_use]
    pub fn request(&self) -> &http::Request<Bytes> {
        &self.request
    }

    /// Mutable access to the inbound request (header propagation).
    pub fn request_mut(&mut self) -> &mut http::Request<Bytes> {
        &mut self.request
    }

    /// The request body as text.
    ///
    /// # Errors
    ///
    /// [`AdapterError::InvalidEncoding`] when the body is not valid UTF-8;
    /// callers must surface this rather than treat it as an empty body.
    pub fn body_utf8(&self) -> Result<&str, AdapterError> {
        std::str::from_utf8(self.request.body()).map_err(|_| AdapterError::InvalidEncoding {
            name: "body".to_owned(),
        })
    }

    /// Unwrap into the request for the terminal operation.
    #[must_use]
    pub fn into_request(self) -> http::Request<Bytes> {
        self.request
    }
}

/// The real operation at the end of the chain.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// Perform the operation.
    async fn handle(&self, request: http::Request<Bytes>) -> http::Response<Bytes>;
}

/// One link of the interception chain.
///
/// A link must resolve every call exactly once: either return a response
/// directly or pass the call on with [`Chain::proceed`].
#[async_trait]
pub trait EntryInterceptor: Send + Sync {
    /// Inspect the call; abort it or forward it down the chain.
    async fn intercept(&self, call: InterceptedCall, chain: Chain<'_>) -> http::Response<Bytes>;
}

/// Continuation handle over the remaining interceptors and the terminal
/// operation.
///
/// Deliberately neither `Clone` nor `Copy`: [`Chain::proceed`] consumes the
/// handle, so a link cannot forward the same call twice.
pub struct Chain<'a> {
    links: &'a [Arc<dyn EntryInterceptor>],
    terminal: &'a dyn OperationHandler,
}

impl<'a> Chain<'a> {
    /// Assemble a chain over `links`, ending at `terminal`.
    #[must_use]
    pub fn new(links: &'a [Arc<dyn EntryInterceptor>], terminal: &'a dyn OperationHandler) -> Self {
        Self { links, terminal }
    }

    /// Invoke the next link, or the terminal operation when none remain.
    pub async fn proceed(self, call: InterceptedCall) -> http::Response<Bytes> {
        match self.links.split_first() {
            Some((head, rest)) => {
                let next = Chain {
                    links: rest,
                    terminal: self.terminal,
                };
                head.intercept(call, next).await
            }
            None => self.terminal.handle(call.into_request()).await,
        }
    }
}
