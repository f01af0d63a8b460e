//! Service declarations.
//!
//! Services register themselves explicitly at startup as a list of
//! [`ServiceDecl`] values: every callable operation together with the
//! markers attached to it. The registry builder consumes this list once per
//! build run; nothing is discovered reflectively at runtime.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::descriptor::OperationDescriptor;

/// Well-known markers.
pub mod markers {
    use super::Marker;

    /// Marks an operation as requiring authorization before it executes.
    pub const AUTHORIZED: Marker = Marker::from_static("authorized");
}

/// A declarative tag attached to a declared operation.
///
/// Markers carry no parameters; an operation either bears a marker or it
/// does not. The marker name doubles as the suffix of generated guard names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marker(Cow<'static, str>);

impl Marker {
    /// Marker with a `'static` name, usable in `const` context.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Marker with an owned name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Marker name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// One declared operation: its descriptor plus attached markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationDecl {
    descriptor: OperationDescriptor,
    markers: Vec<Marker>,
}

impl OperationDecl {
    /// Declare an operation with no markers.
    #[must_use]
    pub fn new(descriptor: OperationDescriptor) -> Self {
        Self {
            descriptor,
            markers: Vec::new(),
        }
    }

    /// Attach a marker to this operation.
    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        if !self.markers.contains(&marker) {
            self.markers.push(marker);
        }
        self
    }

    /// The operation's descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    /// Markers attached to this operation.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Whether the given marker is attached.
    #[must_use]
    pub fn has_marker(&self, marker: &Marker) -> bool {
        self.markers.contains(marker)
    }
}

/// A declared service: owning type plus its operations in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDecl {
    type_name: String,
    operations: Vec<OperationDecl>,
}

impl ServiceDecl {
    /// Declare a service by its fully-qualified type name.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            operations: Vec::new(),
        }
    }

    /// Append an operation in declaration order.
    #[must_use]
    pub fn with_operation(mut self, operation: OperationDecl) -> Self {
        self.operations.push(operation);
        self
    }

    /// Fully-qualified type name of the service.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Declared operations, in declaration order.
    #[must_use]
    pub fn operations(&self) -> &[OperationDecl] {
        &self.operations
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn echo_decl() -> ServiceDecl {
        ServiceDecl::new("demo.echo.EchoService")
            .with_operation(
                OperationDecl::new(OperationDescriptor::new(
                    "demo.echo.EchoService",
                    "echo",
                    ["String"],
                    "String",
                ))
                .with_marker(markers::AUTHORIZED),
            )
            .with_operation(OperationDecl::new(OperationDescriptor::new(
                "demo.echo.EchoService",
                "ping",
                Vec::<String>::new(),
                "String",
            )))
    }

    #[test]
    fn marker_presence() {
        let decl = echo_decl();
        assert!(decl.operations()[0].has_marker(&markers::AUTHORIZED));
        assert!(!decl.operations()[1].has_marker(&markers::AUTHORIZED));
    }

    #[test]
    fn duplicate_markers_collapse() {
        let op = OperationDecl::new(OperationDescriptor::new(
            "demo.echo.EchoService",
            "echo",
            ["String"],
            "String",
        ))
        .with_marker(markers::AUTHORIZED)
        .with_marker(markers::AUTHORIZED);

        assert_eq!(op.markers().len(), 1);
    }

    #[test]
    fn declaration_order_is_preserved() {
        let decl = echo_decl();
        let names: Vec<&str> = decl
            .operations()
            .iter()
            .map(|op| op.descriptor().name())
            .collect();
        assert_eq!(names, ["echo", "ping"]);
    }
}
