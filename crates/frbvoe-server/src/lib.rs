//! frbvoe server library logic.

pub mod api_subscriber;
pub mod api_tns;
pub mod api_voe;
pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

use frbvoe_db::DbPool;
use frbvoe_notify::BrokerClient;
use frbvoe_tns::TnsAgent;

use crate::config::Config;

/// Maximum request body size (2 MiB). Protects against OOM from oversized
/// payloads.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Broker push client; `None` disables broker fan-out.
    pub broker: Option<BrokerClient>,
}

impl AppState {
    /// Builds application state from a pool and loaded configuration.
    pub fn new(pool: DbPool, config: Config) -> Self {
        let broker = config
            .broker
            .url
            .as_ref()
            .map(|url| BrokerClient::new(url.clone(), config.broker.stream.clone()));
        Self {
            pool,
            config: Arc::new(config),
            broker,
        }
    }

    /// Builds a fresh TNS agent for one submission.
    ///
    /// Agent state is per-submission, so every request gets its own
    /// instance. Credential and identity fields are only set when
    /// configured — an unconfigured agent fails fast on use instead of
    /// sending empty credentials over the wire.
    pub fn tns_agent(&self, sandbox_override: Option<bool>) -> TnsAgent {
        let tns = &self.config.tns;
        let mut agent = TnsAgent::new();
        if !tns.api_key.is_empty() {
            agent.set_api_key(&tns.api_key);
        }
        if !tns.bot_id.is_empty() && !tns.bot_name.is_empty() {
            agent.set_bot(&tns.bot_id, &tns.bot_name);
        }
        match &tns.url {
            Some(url) => agent.set_base_url(url),
            None => {
                if sandbox_override.unwrap_or(tns.sandbox) {
                    agent.set_sandbox();
                } else {
                    agent.set_live();
                }
            }
        }
        agent.set_poll_policy(
            Duration::from_secs(tns.poll_interval_secs),
            tns.poll_attempts,
        );
        agent
    }
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body did not deserialize into the expected record.
    #[error("invalid request body: {0}")]
    BadBody(String),

    /// The record failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A required query parameter is missing.
    #[error("missing query parameter: {0}")]
    MissingParam(&'static str),

    /// A storage operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// A blocking task panicked or was cancelled.
    #[error("internal task error: {0}")]
    Task(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            ApiError::BadBody(_) | ApiError::Validation(_) | ApiError::MissingParam(_) => {
                axum::http::StatusCode::BAD_REQUEST
            }
            ApiError::Database(_) | ApiError::Task(_) => {
                axum::http::StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Health check handler.
///
/// Returns `200 OK` with server status and version. Used by monitoring
/// and CI to verify the server is running.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/voe",
            post(api_voe::create_voe_handler).delete(api_voe::delete_voe_handler),
        )
        .route("/tns", post(api_tns::submit_tns_handler))
        .route(
            "/tns/prop-period",
            post(api_tns::change_prop_period_handler),
        )
        .route("/tns/search", get(api_tns::search_handler))
        .route(
            "/subscriber",
            post(api_subscriber::add_subscriber_handler)
                .delete(api_subscriber::delete_subscriber_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
