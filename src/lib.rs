//! Accounts is a small user account service: creation, lookup and
//! credential-checked updates.

#![forbid(unsafe_code)]
pub mod config;
pub mod crypto;
pub mod database;
pub mod error;
mod router;
pub mod telemetry;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::get;
use axum::{Router, middleware as AxumMiddleware};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use crate::config::Configuration;
use crate::crypto::PasswordManager;
use crate::user::{AccountService, UserRepository};

/// Environment variable holding the password secret suffix.
pub const SALT_ENV: &str = "SALT";

/// Errors raised while building the [`AppState`].
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("missing `SALT` environment variable")]
    MissingSalt,
    #[error(transparent)]
    Crypto(#[from] crypto::CryptoError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Configuration>,
    pub service: AccountService,
    pub metrics: Option<PrometheusHandle>,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Dropping the request future cancels in-flight storage calls.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        );

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        .route("/metrics", get(router::metrics))
        // `POST /UserService/<Method>` goes to the account service.
        .nest("/UserService", router::user_service())
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state(
    config: Configuration,
    metrics: Option<PrometheusHandle>,
) -> Result<AppState, InitError> {
    let salt = std::env::var(SALT_ENV).map_err(|_| InitError::MissingSalt)?;
    let pwd = Arc::new(PasswordManager::new(salt)?);

    let repo: Arc<dyn UserRepository> = match config.postgres {
        Some(ref postgres) => {
            let db = database::Database::new(
                &postgres.address,
                postgres
                    .username
                    .as_deref()
                    .unwrap_or(database::DEFAULT_CREDENTIALS),
                postgres
                    .password
                    .as_deref()
                    .unwrap_or(database::DEFAULT_CREDENTIALS),
                postgres
                    .database
                    .as_deref()
                    .unwrap_or(database::DEFAULT_DATABASE_NAME),
                postgres.pool_size.unwrap_or(database::DEFAULT_POOL_SIZE),
                config.timeout(),
            )
            .await?;

            // execute migrations scripts on start.
            db.migrate().await?;

            Arc::new(database::PgUserRepository::new(db.postgres))
        },
        None => {
            tracing::warn!(
                "missing `postgres` entry on configuration, users are kept in memory"
            );
            Arc::new(database::MemoryUserRepository::new())
        },
    };

    Ok(AppState {
        config: Arc::new(config),
        service: AccountService::new(repo, pwd),
        metrics,
    })
}
