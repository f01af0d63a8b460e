//! Operation descriptors.
//!
//! An [`OperationDescriptor`] identifies one callable operation of a declared
//! service: owning type, method name, ordered parameter types and return
//! type. Descriptors are built once while services are declared and never
//! mutated afterwards; the runtime only compares them.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Immutable identity of one callable operation.
///
/// Two descriptors are equal iff their owner and canonical signature match
/// exactly; there is no overload resolution beyond the signature. Both the
/// canonical signature and the `owner::signature` key are computed once at
/// construction so per-call matching never rebuilds strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "DescriptorParts", into = "DescriptorParts")]
pub struct OperationDescriptor {
    owner: String,
    name: String,
    parameter_types: Vec<String>,
    return_type: String,
    signature: String,
    qualified_key: String,
}

/// Serialized shape of a descriptor; derived fields are rebuilt on load.
#[derive(Serialize, Deserialize)]
struct DescriptorParts {
    owner: String,
    name: String,
    parameter_types: Vec<String>,
    return_type: String,
}

impl OperationDescriptor {
    /// Create a descriptor for `owner.name(parameter_types...) -> return_type`.
    ///
    /// `owner` is a fully-qualified dotted type identifier, e.g.
    /// `"demo.echo.EchoService"`.
    #[must_use]
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        parameter_types: impl IntoIterator<Item = impl Into<String>>,
        return_type: impl Into<String>,
    ) -> Self {
        let owner = owner.into();
        let name = name.into();
        let parameter_types: Vec<String> = parameter_types.into_iter().map(Into::into).collect();
        let return_type = return_type.into();

        let signature = format!(
            "{return_type} {name}({params})",
            params = parameter_types.join(",")
        );
        let qualified_key = format!("{owner}::{signature}");

        Self {
            owner,
            name,
            parameter_types,
            return_type,
            signature,
            qualified_key,
        }
    }

    /// Fully-qualified owning type identifier.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Method identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered parameter type identifiers.
    #[must_use]
    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    /// Return type identifier.
    #[must_use]
    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    /// Canonical signature, `"{return_type} {name}({p1},{p2},...)"`.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Namespace-qualified key, `"{owner}::{signature}"`.
    #[must_use]
    pub fn qualified_key(&self) -> &str {
        &self.qualified_key
    }

    /// Namespace of the owning type: the owner minus its final segment.
    ///
    /// An owner without a `.` separator lives in the empty namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.owner
            .rsplit_once('.')
            .map_or("", |(namespace, _)| namespace)
    }
}

impl PartialEq for OperationDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.signature == other.signature
    }
}

impl Eq for OperationDescriptor {}

impl Hash for OperationDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.signature.hash(state);
    }
}

impl fmt::Display for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_key)
    }
}

impl From<DescriptorParts> for OperationDescriptor {
    fn from(parts: DescriptorParts) -> Self {
        Self::new(
            parts.owner,
            parts.name,
            parts.parameter_types,
            parts.return_type,
        )
    }
}

impl From<OperationDescriptor> for DescriptorParts {
    fn from(descriptor: OperationDescriptor) -> Self {
        Self {
            owner: descriptor.owner,
            name: descriptor.name,
            parameter_types: descriptor.parameter_types,
            return_type: descriptor.return_type,
        }
    }
}
