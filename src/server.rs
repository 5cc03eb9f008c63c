//! HTTP server for receiving Telegram webhook updates.

use crate::config::Config;
use crate::detect;
use crate::resolver::Resolver;
use crate::security;
use crate::store::PreferenceStore;
use crate::telegram::{self, Update};
use anyhow::Result;
use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Header Telegram attaches to webhook deliveries when a secret token is set.
const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Shared state for webhook handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<PreferenceStore>,
    pub resolver: Arc<Resolver>,
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config, store: PreferenceStore) -> Self {
        let resolver = Resolver::new(detect::from_name(&config.classifier));
        // Bounded timeout so a stalled upstream cannot occupy a worker forever
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            config,
            store: Arc::new(store),
            resolver: Arc::new(resolver),
            client,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn run(state: AppState) -> Result<()> {
    let addr = format!("0.0.0.0:{}", state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Webhook server listening on {}", addr);

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

/// Liveness probe.
async fn health() -> &'static str {
    "ok"
}

/// Handle one webhook delivery. The shared-secret header is checked before
/// any processing; accepted updates are dispatched to a background task so
/// Telegram gets its 200 immediately and never retries a slow translation.
async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> StatusCode {
    let presented = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !security::constant_time_compare(presented, &state.config.telegram_webhook_secret) {
        warn!("Rejected webhook delivery with invalid secret");
        return StatusCode::UNAUTHORIZED;
    }

    let update_id = update.update_id;
    tokio::spawn(async move {
        if let Err(e) =
            telegram::handle_update(&state.config, &state.store, &state.resolver, &state.client, update)
                .await
        {
            error!("Failed to process update {}: {:#}", update_id, e);
        }
    });

    StatusCode::OK
}
