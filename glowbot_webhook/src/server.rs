//! Axum server: webhook route plus a health probe.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use glowbot_agent::ConsultationAgent;
use glowbot_core::SessionLocks;

use crate::client::PlatformClient;
use crate::payload::parse_webhook;
use crate::{CODE_IRRELEVANT, CODE_OPERATOR, Error};

#[derive(Clone)]
pub struct AppState {
    agent: Arc<ConsultationAgent>,
    locks: Arc<SessionLocks>,
    client: PlatformClient,
    /// Expected inbound token; empty disables validation.
    expected_token: String,
}

impl AppState {
    #[must_use]
    pub fn new(agent: Arc<ConsultationAgent>, client: PlatformClient, expected_token: String) -> Self {
        Self {
            agent,
            locks: Arc::new(SessionLocks::new()),
            client,
            expected_token,
        }
    }
}

#[derive(Debug, Serialize)]
struct WebhookResponse {
    success: bool,
    session_id: String,
    message: &'static str,
}

#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Webhook server listening on {addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn handle_webhook(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<WebhookResponse>, Error> {
    let inbound = parse_webhook(&payload)?;

    if !state.expected_token.is_empty() && inbound.token != state.expected_token {
        return Err(Error::Unauthorized);
    }

    let session_key = inbound.session_key();
    info!("[{session_key}] inbound message ({} chars)", inbound.text.chars().count());

    state.client.simulate_typing(&inbound.token, 30).await;

    let result_state = {
        let _guard = state.locks.acquire(&session_key).await;
        state.agent.handle_message(&session_key, &inbound.text).await
    };

    let reply = result_state
        .last_assistant_text()
        .unwrap_or("Извините, не удалось получить ответ.")
        .to_string();

    state.client.send_message(&inbound.token, &reply).await?;

    // Service codes increment platform counters / switch the dialog to an
    // operator; failures are logged, the reply already went out.
    if result_state.flags.irrelevant {
        info!("[{session_key}] irrelevant question, reporting {CODE_IRRELEVANT}");
        if let Err(e) = state.client.finish_with_code(&inbound.token, CODE_IRRELEVANT).await {
            warn!("[{session_key}] failed to report {CODE_IRRELEVANT}: {e}");
        }
    }
    if result_state.flags.wants_operator {
        info!("[{session_key}] operator requested, reporting {CODE_OPERATOR}");
        if let Err(e) = state.client.finish_with_code(&inbound.token, CODE_OPERATOR).await {
            warn!("[{session_key}] failed to report {CODE_OPERATOR}: {e}");
        }
    }

    Ok(Json(WebhookResponse {
        success: true,
        session_id: inbound.session_id,
        message: "reply sent",
    }))
}
