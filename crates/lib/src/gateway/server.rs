//! Gateway HTTP server: liveness probe, webhook handshake and webhook delivery (single port).

use crate::channels::{InstagramChannel, ReplySender, WebhookPayload};
use crate::config::RelayConfig;
use crate::dispatch::Dispatcher;
use crate::gateway::error::WebhookError;
use crate::verify::{self, SIGNATURE_HEADER};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Shared state for the gateway. Read-only after startup.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<RelayConfig>,
    pub dispatcher: Dispatcher,
}

impl GatewayState {
    pub fn new(config: RelayConfig, sender: Arc<dyn ReplySender>) -> Self {
        let dispatcher = Dispatcher::new(config.instagram.ig_user_id.clone(), sender);
        Self {
            config: Arc::new(config),
            dispatcher,
        }
    }
}

/// Query of the subscription handshake: `hub.mode`, `hub.verify_token`, `hub.challenge`.
#[derive(Debug, Default, Deserialize)]
pub struct HandshakeQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Routes: `GET /`, `GET /webhook`, `POST /webhook`.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/webhook", get(webhook_handshake).post(webhook_events))
        .with_state(state)
}

/// Run the relay; binds to config.gateway.bind:config.gateway.port.
/// Missing tokens are logged as warnings and do not stop startup.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: RelayConfig) -> Result<()> {
    for warning in config.startup_warnings() {
        log::warn!("{}", warning);
    }
    let channel = Arc::new(InstagramChannel::new(&config.instagram));
    log::info!(
        "{} channel replying via {}",
        channel.id(),
        channel.messages_url()
    );
    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let app = build_router(GatewayState::new(config, channel));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("webhook listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns "ok" (for probes).
async fn health_http() -> &'static str {
    "ok"
}

/// GET /webhook — subscription handshake; echoes `hub.challenge` when mode and token match.
async fn webhook_handshake(
    State(state): State<GatewayState>,
    Query(query): Query<HandshakeQuery>,
) -> Result<String, WebhookError> {
    verify::verify_handshake(
        query.mode.as_deref(),
        query.verify_token.as_deref(),
        query.challenge.as_deref(),
        state.config.instagram.verify_token.as_deref(),
    )
    .map(|challenge| {
        log::info!("webhook subscription verified");
        challenge
    })
    .ok_or_else(|| {
        log::warn!("webhook handshake rejected (mode {:?})", query.mode);
        WebhookError::HandshakeFailure
    })
}

/// POST /webhook — checks the signature over the raw body, then replies to each qualifying event.
async fn webhook_events(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    if !verify::verify_signature(state.config.instagram.app_secret.as_deref(), signature, &body) {
        log::warn!("webhook signature check failed");
        return Err(WebhookError::AuthFailure);
    }
    let body: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| WebhookError::MalformedBody(e.to_string()))?;
    match state.dispatcher.dispatch(&WebhookPayload::new(body)).await {
        Ok(summary) => {
            log::debug!(
                "webhook processed: {} sent, {} rejected, {} skipped",
                summary.sent,
                summary.rejected,
                summary.skipped
            );
            Ok(StatusCode::OK)
        }
        Err(e @ WebhookError::Unexpected(_)) => {
            log::error!("webhook error: {}", e);
            Err(e)
        }
        Err(e) => {
            log::debug!("{}", e);
            Err(e)
        }
    }
}
