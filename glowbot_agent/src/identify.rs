//! Identify step: extract the caller's name and gender.

use serde::Deserialize;
use tracing::{error, warn};

use glowbot_core::prompts::{CLARIFY_PROCEDURE_PHRASE, GENERIC_APOLOGY, IDENTIFICATION_PROMPT};
use glowbot_core::reply::extract_json_object;
use glowbot_core::{PromptMessage, SessionState, Turn};

use crate::agent::{ConsultationAgent, Step, prefix};

/// Shape the identification prompt asks the model to answer in.
#[derive(Debug, Deserialize)]
struct ProfileExtraction {
    response: Option<String>,
    #[serde(default)]
    client_name: Option<String>,
    #[serde(default)]
    gender: Option<String>,
}

impl ConsultationAgent {
    /// Skipped once both profile fields are known. Otherwise one model
    /// call; its JSON reply carries the assistant-facing text plus the
    /// extracted fields. The turn ends here unless the profile became
    /// complete without the extractor asking its clarifying question.
    pub(crate) async fn identify(&self, state: &mut SessionState) -> Step {
        if state.profile_complete() {
            return Step::Classify;
        }
        if !state.last_turn().is_some_and(Turn::is_user) {
            return Step::Done;
        }
        let user_query = state.last_user_text().unwrap_or_default().to_string();

        let mut messages = vec![PromptMessage::system(IDENTIFICATION_PROMPT)];
        messages.extend(state.chat_history());
        messages.push(PromptMessage::user(format!(
            "Ответ пользователя: '{user_query}'"
        )));

        let raw = match self.model.invoke(&messages).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("[{}] identify failed: {e}", prefix(&state.session_id));
                state.push(Turn::assistant(GENERIC_APOLOGY));
                return Step::Done;
            }
        };

        let Some(json_str) = extract_json_object(&raw) else {
            warn!(
                "[{}] identify: no JSON object in reply: {raw}",
                prefix(&state.session_id)
            );
            return Step::Done;
        };

        match serde_json::from_str::<ProfileExtraction>(json_str) {
            Ok(extraction) => {
                if let Some(reply) = extraction.response {
                    state.merge_profile(extraction.client_name, extraction.gender);
                    let asks_for_procedure = reply.contains(CLARIFY_PROCEDURE_PHRASE);
                    state.push(Turn::assistant(reply));
                    if asks_for_procedure {
                        // Clarifying-question leaf: wait for the answer.
                        return Step::Done;
                    }
                }
            }
            Err(e) => {
                warn!(
                    "[{}] identify: JSON decode failed: {e}; reply was: {raw}",
                    prefix(&state.session_id)
                );
            }
        }

        if state.profile_complete() {
            Step::Classify
        } else {
            Step::Done
        }
    }
}
