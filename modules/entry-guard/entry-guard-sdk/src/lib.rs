//! Entry-guard SDK
//!
//! This crate provides the public contracts of the `entry-guard` module:
//!
//! - [`AuthorizationFilter`] - plugin boundary for authorization policies
//! - [`RequestView`] - normalized per-call view handed to filters
//! - [`AuthzOutcome`] - allow / abort result of an enforcement run
//! - [`FilterError`], [`AdapterError`] - error types
//!
//! ## Usage
//!
//! ```ignore
//! use entry_guard_sdk::{AuthorizationFilter, FilterError, RequestView};
//!
//! struct DenyAll;
//!
//! #[async_trait::async_trait]
//! impl AuthorizationFilter for DenyAll {
//!     async fn filter(&self, view: &mut RequestView) -> Result<(), FilterError> {
//!         view.abort(http::StatusCode::FORBIDDEN, "");
//!         Ok(())
//!     }
//! }
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod error;
pub mod filter;
pub mod outcome;
pub mod view;

pub use error::{AdapterError, FilterError};
pub use filter::AuthorizationFilter;
pub use outcome::AuthzOutcome;
pub use view::RequestView;
