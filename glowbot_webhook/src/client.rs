//! Outbound bot-API client for the chat platform.

use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::Error;

/// Platform hard limit on one message.
const MAX_MESSAGE_CHARS: usize = 4000;

/// Attempts per send; delay grows linearly with the attempt number.
const SEND_ATTEMPTS: u64 = 3;

#[derive(Clone)]
pub struct PlatformClient {
    http: Client,
    base_url: String,
}

/// Char-safe truncation to the platform's message limit.
fn truncate_text(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

impl PlatformClient {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    async fn post(&self, path: &str, token: &str, body: &Value) -> Result<(), Error> {
        let response = self
            .http
            .post(format!("{}/{path}", self.base_url))
            .header("X-Token", token)
            .json(body)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| Error::Platform(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Platform(e.to_string()))?;

        let data = response
            .json::<Value>()
            .await
            .map_err(|e| Error::Platform(e.to_string()))?;

        if data.get("success").and_then(Value::as_bool) == Some(true) {
            Ok(())
        } else {
            Err(Error::Platform(format!("platform rejected the call: {data}")))
        }
    }

    /// Send the reply text to the client, retrying transient failures.
    pub async fn send_message(&self, token: &str, text: &str) -> Result<(), Error> {
        let body = json!({
            "content": { "text": truncate_text(text, MAX_MESSAGE_CHARS) }
        });

        let mut last_error = Error::Platform("no attempts made".to_string());
        for attempt in 1..=SEND_ATTEMPTS {
            match self.post("customBot/send", token, &body).await {
                Ok(()) => {
                    info!("Reply delivered (attempt {attempt})");
                    return Ok(());
                }
                Err(e) => {
                    warn!("Send failed (attempt {attempt}/{SEND_ATTEMPTS}): {e}");
                    if attempt < SEND_ATTEMPTS {
                        sleep(Duration::from_secs(attempt)).await;
                    }
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    /// Best-effort typing indicator while the agent works.
    pub async fn simulate_typing(&self, token: &str, ttl_secs: u64) {
        let body = json!({ "ttl": ttl_secs });
        if let Err(e) = self.post("customBot/simulateTyping", token, &body).await {
            warn!("Typing simulation failed: {e}");
        }
    }

    /// Report a service code (counter increment or operator handoff). The
    /// dialog itself is not finished.
    pub async fn finish_with_code(&self, token: &str, code: &str) -> Result<(), Error> {
        let body = json!({ "code": code });
        self.post("customBot/finish", token, &body).await
    }
}
