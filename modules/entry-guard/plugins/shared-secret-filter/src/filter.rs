//! Shared-secret filter implementation.

use async_trait::async_trait;
use entry_guard_sdk::{AuthorizationFilter, FilterError, RequestView};
use http::{HeaderName, StatusCode};
use secrecy::{ExposeSecret, SecretString};

use crate::config::SharedSecretFilterConfig;

/// Error turning a [`SharedSecretFilterConfig`] into a filter.
#[derive(Debug, thiserror::Error)]
pub enum PluginConfigError {
    /// A configured header name is not a valid header name.
    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),
}

/// Compares a designated header against a shared-secret token.
///
/// Constructed once and shared across calls; holds no per-call state.
pub struct SharedSecretFilter {
    header: HeaderName,
    principal_header: HeaderName,
    token: SecretString,
}

impl SharedSecretFilter {
    /// Filter with the default header pair (`authorization` / `user`).
    #[must_use]
    pub fn new(token: SecretString) -> Self {
        Self {
            header: http::header::AUTHORIZATION,
            principal_header: HeaderName::from_static("user"),
            token,
        }
    }

    /// Filter from configuration.
    ///
    /// # Errors
    ///
    /// [`PluginConfigError::InvalidHeaderName`] when a configured header
    /// name cannot be used as one.
    pub fn from_config(cfg: &SharedSecretFilterConfig) -> Result<Self, PluginConfigError> {
        let parse = |name: &str| {
            name.parse::<HeaderName>()
                .map_err(|_| PluginConfigError::InvalidHeaderName(name.to_owned()))
        };
        Ok(Self {
            header: parse(&cfg.header)?,
            principal_header: parse(&cfg.principal_header)?,
            token: cfg.token.clone(),
        })
    }
}

impl std::fmt::Debug for SharedSecretFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretFilter")
            .field("header", &self.header)
            .field("principal_header", &self.principal_header)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthorizationFilter for SharedSecretFilter {
    async fn filter(&self, view: &mut RequestView) -> Result<(), FilterError> {
        let presented = view.header(&self.header)?.map(ToOwned::to_owned);
        let token = self.token.expose_secret();

        match presented {
            Some(value) if !token.is_empty() && value == token => {
                tracing::debug!(path = view.path(), "authorizing access");
                view.set_header(self.principal_header.clone(), &value)?;
                Ok(())
            }
            _ => {
                tracing::debug!(path = view.path(), "rejecting access");
                view.abort(StatusCode::UNAUTHORIZED, "");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use entry_guard_sdk::AuthzOutcome;
    use http::{HeaderMap, HeaderValue};

    fn filter() -> SharedSecretFilter {
        SharedSecretFilter::new(SecretString::from("helidon".to_owned()))
    }

    fn view(auth: Option<&str>) -> RequestView {
        let mut headers = HeaderMap::new();
        if let Some(value) = auth {
            headers.insert(http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        RequestView::new("/echo", headers)
    }

    #[tokio::test]
    async fn matching_token_allows_and_records_principal() {
        let mut view = view(Some("helidon"));
        filter().filter(&mut view).await.unwrap();

        assert!(!view.is_aborted());
        let (outcome, headers) = view.into_outcome();
        assert_eq!(outcome, AuthzOutcome::Allow);
        assert_eq!(headers.get("user").unwrap(), "helidon");
    }

    #[tokio::test]
    async fn wrong_token_rejects_with_401_and_empty_message() {
        let mut view = view(Some("foo"));
        filter().filter(&mut view).await.unwrap();

        let (outcome, _) = view.into_outcome();
        assert_eq!(outcome, AuthzOutcome::abort(StatusCode::UNAUTHORIZED, ""));
    }

    #[tokio::test]
    async fn missing_header_rejects() {
        let mut view = view(None);
        filter().filter(&mut view).await.unwrap();
        assert!(view.is_aborted());
    }

    #[tokio::test]
    async fn empty_configured_token_rejects_even_an_empty_presented_value() {
        let filter = SharedSecretFilter::new(SecretString::from(String::new()));
        let mut view = view(Some(""));
        filter.filter(&mut view).await.unwrap();
        assert!(view.is_aborted());
    }

    #[tokio::test]
    async fn undecodable_header_is_a_filter_error_not_a_401() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap(),
        );
        let mut view = RequestView::new("/echo", headers);

        let err = filter().filter(&mut view).await.unwrap_err();
        assert!(matches!(err, FilterError::Adapter(_)));
        assert!(!view.is_aborted());
    }

    #[tokio::test]
    async fn custom_headers_from_config() {
        let cfg: SharedSecretFilterConfig = serde_json::from_str(
            r#"{"header": "x-api-key", "principal_header": "x-principal", "token": "s3cret"}"#,
        )
        .unwrap();
        let filter = SharedSecretFilter::from_config(&cfg).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("s3cret"));
        let mut view = RequestView::new("/echo", headers);

        filter.filter(&mut view).await.unwrap();
        let (outcome, headers) = view.into_outcome();
        assert_eq!(outcome, AuthzOutcome::Allow);
        assert_eq!(headers.get("x-principal").unwrap(), "s3cret");
    }

    #[test]
    fn invalid_header_name_is_rejected_at_construction() {
        let cfg = SharedSecretFilterConfig {
            header: "not a header".to_owned(),
            ..SharedSecretFilterConfig::default()
        };
        let err = SharedSecretFilter::from_config(&cfg).unwrap_err();
        assert!(matches!(err, PluginConfigError::InvalidHeaderName(_)));
    }
}
