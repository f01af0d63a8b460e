//! Shared-secret authorization filter plugin.
//!
//! The reference [`AuthorizationFilter`](entry_guard_sdk::AuthorizationFilter)
//! implementation: compares one designated request header against a
//! configured shared-secret token. On a match the call is allowed and the
//! permitted principal is recorded in a second header propagated to the
//! operation; on anything else the call is rejected with 401 and an empty
//! body.
//!
//! Intended for development and demos; production deployments plug in their
//! own filter at the same boundary.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod filter;

pub use config::SharedSecretFilterConfig;
pub use filter::{PluginConfigError, SharedSecretFilter};
