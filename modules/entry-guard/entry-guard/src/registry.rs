//! Guard registry builder.
//!
//! The builder is the generation step: it walks the declared services once,
//! collects every operation bearing the protection marker and emits the
//! guards that will match those operations at runtime.
//!
//! Three indexing strategies implement the same contract and are observably
//! equivalent at the call level; they only trade generated-artifact count
//! against per-call lookup shape. Exactly one strategy is active per build
//! run.
//!
//! A marked operation that cannot be resolved to a concrete
//! owner/signature pair fails the build: a silently dropped guard would
//! leave that operation running unprotected.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use callgate_types::{Marker, OperationDescriptor, ServiceDecl, markers};
use entry_guard_sdk::AuthorizationFilter;
use serde::{Deserialize, Serialize};

use crate::chain::EntryInterceptor;
use crate::policy::PolicyEnforcement;
use crate::unit::{MatchIndex, OperationGuard};

/// How guards are indexed.
///
/// | strategy | guards generated | per-call lookup |
/// |----------|------------------|-----------------|
/// | `PerOperation` | one per protected operation | identity check |
/// | `PerOperationIndexed` | one per protected operation, name disambiguated on collisions | identity check |
/// | `Namespace` | one per namespace | set membership |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStrategy {
    /// One guard per protected operation.
    PerOperation,
    /// One guard per protected operation; a declaration-order index keeps
    /// generated names unique when an owner overloads a method name. The
    /// index is part of the guard's identity only, never of its match.
    PerOperationIndexed,
    /// One guard per namespace, holding the qualified keys of every
    /// protected operation declared in it.
    #[default]
    Namespace,
}

/// Fatal error during a registry build run.
#[derive(Debug, thiserror::Error)]
pub enum RegistryBuildError {
    /// A marked operation has no concrete owner or method name.
    #[error(
        "operation '{operation}' of service '{service}' cannot be resolved \
         to a concrete owner/signature pair"
    )]
    UnresolvedOperation {
        /// Declaring service.
        service: String,
        /// Operation identifier, as far as it could be read.
        operation: String,
    },

    /// Two marked operations of the same owner share a canonical signature
    /// and cannot be told apart at match time.
    #[error("owner '{owner}' declares two protected operations with identical signature '{signature}'")]
    AmbiguousSignature {
        /// Owning type.
        owner: String,
        /// The colliding canonical signature.
        signature: String,
    },

    /// Two generated guards ended up with the same name.
    #[error("generated guard name '{name}' is not unique; use the indexed strategy for overloads")]
    DuplicateUnitName {
        /// The colliding name.
        name: String,
    },
}

/// Immutable set of guards produced by one build run.
pub struct GuardRegistry {
    strategy: IndexStrategy,
    guards: Vec<Arc<OperationGuard>>,
}

impl GuardRegistry {
    /// The strategy this registry was built with.
    #[must_use]
    pub fn strategy(&self) -> IndexStrategy {
        self.strategy
    }

    /// All guards, in generation order.
    #[must_use]
    pub fn guards(&self) -> &[Arc<OperationGuard>] {
        &self.guards
    }

    /// The guards as chain links, in generation order.
    #[must_use]
    pub fn interceptors(&self) -> Vec<Arc<dyn EntryInterceptor>> {
        self.guards
            .iter()
            .map(|guard| guard.clone() as Arc<dyn EntryInterceptor>)
            .collect()
    }

    /// Guards whose match predicate covers the given descriptor.
    #[must_use]
    pub fn matching_guards(&self, descriptor: &OperationDescriptor) -> Vec<&OperationGuard> {
        self.guards
            .iter()
            .map(AsRef::as_ref)
            .filter(|guard| guard.matches(descriptor))
            .collect()
    }

    /// Number of guards in the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Whether the registry holds no guards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl std::fmt::Debug for GuardRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardRegistry")
            .field("strategy", &self.strategy)
            .field("guards", &self.guards.len())
            .finish()
    }
}

/// Builds a [`GuardRegistry`] from service declarations.
pub struct GuardRegistryBuilder {
    strategy: IndexStrategy,
    marker: Marker,
    filter: Arc<dyn AuthorizationFilter>,
}

impl GuardRegistryBuilder {
    /// Builder with the default strategy, scanning for the
    /// [`markers::AUTHORIZED`] marker and enforcing with `filter`.
    #[must_use]
    pub fn new(filter: Arc<dyn AuthorizationFilter>) -> Self {
        Self {
            strategy: IndexStrategy::default(),
            marker: markers::AUTHORIZED,
            filter,
        }
    }

    /// Select the indexing strategy for this build run.
    #[must_use]
    pub fn with_strategy(mut self, strategy: IndexStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Scan for a different marker.
    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = marker;
        self
    }

    /// Walk the declared services and emit the guards.
    ///
    /// # Errors
    ///
    /// Any [`RegistryBuildError`]; a failed build run produces no registry.
    pub fn build(self, services: &[ServiceDecl]) -> Result<GuardRegistry, RegistryBuildError> {
        let marked = collect_marked(services, &self.marker)?;
        let suffix = marker_suffix(&self.marker);
        let enforcement = PolicyEnforcement::new(self.filter);

        let guards = match self.strategy {
            IndexStrategy::PerOperation => per_operation_guards(&marked, None, &suffix, &enforcement),
            IndexStrategy::PerOperationIndexed => {
                let collisions = collision_counts(&marked);
                per_operation_guards(&marked, Some(&collisions), &suffix, &enforcement)
            }
            IndexStrategy::Namespace => namespace_guards(&marked, &suffix, &enforcement),
        };

        ensure_unique_names(&guards)?;

        tracing::info!(
            strategy = ?self.strategy,
            protected_operations = marked.len(),
            guards = guards.len(),
            "built guard registry"
        );

        Ok(GuardRegistry {
            strategy: self.strategy,
            guards,
        })
    }
}

impl std::fmt::Debug for GuardRegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardRegistryBuilder")
            .field("strategy", &self.strategy)
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

/// Collect marked descriptors in declaration order, rejecting unresolvable
/// and ambiguous ones.
fn collect_marked(
    services: &[ServiceDecl],
    marker: &Marker,
) -> Result<Vec<Arc<OperationDescriptor>>, RegistryBuildError> {
    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut marked = Vec::new();

    for service in services {
        for operation in service.operations() {
            if !operation.has_marker(marker) {
                continue;
            }
            let descriptor = operation.descriptor();

            if descriptor.owner().is_empty() || descriptor.name().is_empty() {
                return Err(RegistryBuildError::UnresolvedOperation {
                    service: service.type_name().to_owned(),
                    operation: descriptor.signature().to_owned(),
                });
            }

            if !seen_keys.insert(descriptor.qualified_key().to_owned()) {
                return Err(RegistryBuildError::AmbiguousSignature {
                    owner: descriptor.owner().to_owned(),
                    signature: descriptor.signature().to_owned(),
                });
            }

            marked.push(Arc::new(descriptor.clone()));
        }
    }

    Ok(marked)
}

/// Occurrence counts of `(owner, method)` pairs among marked descriptors.
fn collision_counts(marked: &[Arc<OperationDescriptor>]) -> HashMap<(String, String), usize> {
    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    for descriptor in marked {
        *counts
            .entry((descriptor.owner().to_owned(), descriptor.name().to_owned()))
            .or_default() += 1;
    }
    counts
}

fn per_operation_guards(
    marked: &[Arc<OperationDescriptor>],
    collisions: Option<&HashMap<(String, String), usize>>,
    suffix: &str,
    enforcement: &PolicyEnforcement,
) -> Vec<Arc<OperationGuard>> {
    let mut next_index: HashMap<(String, String), usize> = HashMap::new();

    marked
        .iter()
        .map(|descriptor| {
            let key = (descriptor.owner().to_owned(), descriptor.name().to_owned());
            let index = collisions.and_then(|counts| {
                if counts.get(&key).copied().unwrap_or(0) > 1 {
                    let slot = next_index.entry(key.clone()).or_default();
                    let index = *slot;
                    *slot += 1;
                    Some(index)
                } else {
                    None
                }
            });

            Arc::new(OperationGuard::new(
                operation_unit_name(descriptor, index, suffix),
                MatchIndex::Single {
                    descriptor: descriptor.clone(),
                },
                enforcement.clone(),
            ))
        })
        .collect()
}

fn namespace_guards(
    marked: &[Arc<OperationDescriptor>],
    suffix: &str,
    enforcement: &PolicyEnforcement,
) -> Vec<Arc<OperationGuard>> {
    // BTreeMap keeps generation order deterministic across runs.
    let mut by_namespace: BTreeMap<String, HashSet<String>> = BTreeMap::new();
    for descriptor in marked {
        by_namespace
            .entry(descriptor.namespace().to_owned())
            .or_default()
            .insert(descriptor.qualified_key().to_owned());
    }

    by_namespace
        .into_iter()
        .map(|(namespace, keys)| {
            Arc::new(OperationGuard::new(
                namespace_unit_name(&namespace, suffix),
                MatchIndex::Namespace { namespace, keys },
                enforcement.clone(),
            ))
        })
        .collect()
}

fn ensure_unique_names(guards: &[Arc<OperationGuard>]) -> Result<(), RegistryBuildError> {
    let mut names: HashSet<&str> = HashSet::new();
    for guard in guards {
        if !names.insert(guard.name()) {
            return Err(RegistryBuildError::DuplicateUnitName {
                name: guard.name().to_owned(),
            });
        }
    }
    Ok(())
}

/// Name suffix derived from the marker, first letter uppercased.
fn marker_suffix(marker: &Marker) -> String {
    let mut chars = marker.name().chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn operation_unit_name(
    descriptor: &OperationDescriptor,
    index: Option<usize>,
    suffix: &str,
) -> String {
    let owner = descriptor.owner().replace('.', "_");
    let method = descriptor.name();
    match index {
        Some(index) => format!("{owner}_{method}_{index}__{suffix}"),
        None => format!("{owner}_{method}__{suffix}"),
    }
}

fn namespace_unit_name(namespace: &str, suffix: &str) -> String {
    if namespace.is_empty() {
        format!("root__{suffix}")
    } else {
        format!("{}__{suffix}", namespace.replace('.', "_"))
    }
}
