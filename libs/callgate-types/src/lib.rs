//! Callgate shared types
//!
//! This crate provides the vocabulary shared by the build-time registry
//! builder and the runtime guards:
//!
//! - [`OperationDescriptor`] - immutable identity of one callable operation
//! - [`Marker`] / [`markers`] - declarative tags attached to operations
//! - [`ServiceDecl`], [`OperationDecl`] - declared services and their operations
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod descriptor;
pub mod service;

pub use descriptor::OperationDescriptor;
pub use service::{Marker, OperationDecl, ServiceDecl, markers};
