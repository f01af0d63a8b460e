//! Entry-point guard module.
//!
//! Enforces an authorization policy on selected operations of a service by
//! intercepting calls before they execute:
//!
//! - [`GuardRegistryBuilder`] scans service declarations once and builds
//!   guards for every operation bearing the protection marker
//! - [`OperationGuard`] matches intercepted calls against its index and runs
//!   the enforcement step on a hit
//! - [`Chain`] threads a call through the ordered interceptors down to the
//!   real operation
//! - [`PolicyEnforcement`] adapts a call for the configured
//!   [`AuthorizationFilter`](entry_guard_sdk::AuthorizationFilter) and
//!   interprets its outcome
//!
//! The registry is immutable once built; guards are shared across calls
//! without locking.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod chain;
pub mod config;
pub mod policy;
pub mod registry;
pub mod unit;

pub use chain::{Chain, EntryInterceptor, InterceptedCall, OperationHandler};
pub use config::EntryGuardConfig;
pub use policy::{PolicyEnforcement, TimeboxedFilter};
pub use registry::{GuardRegistry, GuardRegistryBuilder, IndexStrategy, RegistryBuildError};
pub use unit::OperationGuard;
