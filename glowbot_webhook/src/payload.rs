//! Inbound webhook payload normalization.
//!
//! The platform sends several payload shapes depending on the channel the
//! client writes from, so every field is extracted with fallbacks. The
//! result is one normalized message or a parse error; nothing downstream
//! looks at raw JSON.

use serde_json::Value;

use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Per-dialog API token used for outbound calls.
    pub token: String,
    pub session_id: String,
    pub user_id: String,
    pub text: String,
}

impl InboundMessage {
    /// Channel-scoped session key for the orchestrator.
    #[must_use]
    pub fn session_key(&self) -> String {
        format!("talkme:{}", self.user_id)
    }
}

fn string_at<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Parse a raw webhook body into a normalized message.
pub fn parse_webhook(data: &Value) -> Result<InboundMessage, Error> {
    let token = string_at(data, "token")
        .ok_or_else(|| Error::BadRequest("missing auth token".to_string()))?
        .to_string();

    let mut session_id = string_at(data, "session_id").unwrap_or_default().to_string();
    if session_id.is_empty() {
        if let Some(dialog_id) = data
            .get("originalOnlineChatMessage")
            .and_then(|m| m.get("dialogId"))
        {
            session_id = match dialog_id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
        }
    }

    let mut user_id = string_at(data, "user_id").unwrap_or_default().to_string();
    if user_id.is_empty() {
        if let Some(client) = data.get("client") {
            user_id = string_at(client, "clientId")
                .or_else(|| string_at(client, "login"))
                .unwrap_or_default()
                .to_string();
        }
    }

    // The message text may be nested or flat depending on the channel.
    let text = match data.get("message") {
        Some(Value::Object(message)) => message
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };
    let text = if text.is_empty() {
        string_at(data, "text")
            .or_else(|| string_at(data, "body"))
            .unwrap_or_default()
            .to_string()
    } else {
        text
    };

    if text.is_empty() {
        return Err(Error::BadRequest("empty message text".to_string()));
    }

    // One id can stand in for the other, but not both missing.
    if user_id.is_empty() {
        user_id.clone_from(&session_id);
    }
    if session_id.is_empty() {
        session_id.clone_from(&user_id);
    }
    if user_id.is_empty() {
        return Err(Error::BadRequest("no session or user id".to_string()));
    }

    Ok(InboundMessage {
        token,
        session_id,
        user_id,
        text,
    })
}
