//! Demo echo service.
//!
//! A small service with two protected operations (`echo`, `twice`) and one
//! public operation (`ping`), dispatched through the entry-guard chain. The
//! HTTP transport lives in the `echo-server` binary; the library only routes
//! already-parsed requests.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod dispatch;
pub mod service;

pub use dispatch::EchoApp;
pub use service::declaration;
