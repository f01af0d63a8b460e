//! Configuration for the entry-guard module.

use std::time::Duration;

use serde::Deserialize;

use crate::registry::IndexStrategy;

/// Module configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntryGuardConfig {
    /// Indexing strategy for the build run.
    pub strategy: IndexStrategy,

    /// Upper bound for one filter evaluation, in milliseconds.
    ///
    /// `None` leaves the filter unbounded; set this whenever the filter
    /// performs I/O. An elapsed deadline rejects the call.
    pub filter_timeout_ms: Option<u64>,
}

impl Default for EntryGuardConfig {
    fn default() -> Self {
        Self {
            strategy: IndexStrategy::default(),
            filter_timeout_ms: None,
        }
    }
}

impl EntryGuardConfig {
    /// The configured filter timeout as a [`Duration`].
    #[must_use]
    pub fn filter_timeout(&self) -> Option<Duration> {
        self.filter_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = EntryGuardConfig::default();
        assert_eq!(cfg.strategy, IndexStrategy::Namespace);
        assert_eq!(cfg.filter_timeout(), None);
    }

    #[test]
    fn deserializes_with_partial_fields() {
        let cfg: EntryGuardConfig =
            serde_json::from_str(r#"{"strategy": "per_operation", "filter_timeout_ms": 250}"#)
                .unwrap();
        assert_eq!(cfg.strategy, IndexStrategy::PerOperation);
        assert_eq!(cfg.filter_timeout(), Some(Duration::from_millis(250)));

        let cfg: EntryGuardConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.strategy, IndexStrategy::Namespace);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<EntryGuardConfig>(r#"{"strateg": "namespace"}"#);
        assert!(result.is_err());
    }
}
