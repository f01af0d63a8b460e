//! Echo demo server.
//!
//! Owns the HTTP transport: every request is parsed by axum, handed to the
//! [`EchoApp`] dispatcher and the dispatcher's response is written back.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::routing::any;
use clap::Parser;
use echo_demo::EchoApp;
use entry_guard::{EntryGuardConfig, IndexStrategy, TimeboxedFilter};
use entry_guard_sdk::AuthorizationFilter;
use secrecy::SecretString;
use shared_secret_filter::SharedSecretFilter;
use tracing_subscriber::EnvFilter;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Parser)]
#[command(name = "echo-server", about = "Guarded echo demo service")]
struct Args {
    /// Listen address.
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Shared-secret token accepted by the authorization filter.
    #[arg(long, default_value = "helidon")]
    token: String,

    /// Guard indexing strategy.
    #[arg(long, value_parser = parse_strategy, default_value = "namespace")]
    strategy: IndexStrategy,

    /// Upper bound for one filter evaluation, in milliseconds.
    #[arg(long)]
    filter_timeout_ms: Option<u64>,
}

impl Args {
    fn guard_config(&self) -> EntryGuardConfig {
        EntryGuardConfig {
            strategy: self.strategy,
            filter_timeout_ms: self.filter_timeout_ms,
        }
    }
}

fn parse_strategy(value: &str) -> Result<IndexStrategy, String> {
    match value {
        "per_operation" => Ok(IndexStrategy::PerOperation),
        "per_operation_indexed" => Ok(IndexStrategy::PerOperationIndexed),
        "namespace" => Ok(IndexStrategy::Namespace),
        other => Err(format!("unknown strategy '{other}'")),
    }
}

async fn dispatch(
    State(app): State<Arc<EchoApp>>,
    request: axum::extract::Request,
) -> axum::response::Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::debug!(error = %error, "failed to read request body");
            let mut response = axum::response::Response::new(axum::body::Body::empty());
            *response.status_mut() = http::StatusCode::PAYLOAD_TOO_LARGE;
            return response;
        }
    };

    let request = http::Request::from_parts(parts, bytes);
    app.dispatch(request).await.map(axum::body::Body::from)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = args.guard_config();

    let filter = SharedSecretFilter::new(SecretString::from(args.token));
    let filter: Arc<dyn AuthorizationFilter> = match cfg.filter_timeout() {
        Some(limit) => Arc::new(TimeboxedFilter::new(filter, limit)),
        None => Arc::new(filter),
    };

    let app = Arc::new(EchoApp::build(cfg.strategy, filter)?);

    let router = Router::new()
        .route("/{*path}", any(dispatch))
        .route("/", any(dispatch))
        .with_state(app);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    tracing::info!(addr = %listener.local_addr()?, "echo server listening");
    axum::serve(listener, router).await?;

    Ok(())
}
