//! Lifecycle step: summarize-and-reset for long sessions.

use tracing::{error, info};

use glowbot_core::prompts::{SUMMARY_FAILURE_TEXT, SUMMARY_PREFIX, SUMMARIZE_CONVERSATION_PROMPT};
use glowbot_core::{PromptMessage, SessionState, Turn};

use crate::agent::{ConsultationAgent, Step, prefix};

impl ConsultationAgent {
    /// Once the finalized-assistant-turn count reaches the threshold, the
    /// whole history is replaced by a two-entry seed: the summary (tagged
    /// as a prior user turn) and the most recent finalized reply. This is
    /// the deliberate bound on unbounded growth.
    pub(crate) async fn lifecycle(&self, state: &mut SessionState) -> Step {
        if state.finalized_assistant_count() < self.config.summary_threshold {
            return Step::Done;
        }

        info!(
            "[{}] {} finalized turns, summarizing and resetting",
            prefix(&state.session_id),
            state.finalized_assistant_count()
        );

        let summary = self.summarize(state).await;
        let last_reply = state.history.iter().rev().find(|t| t.is_assistant()).cloned();

        let mut fresh = SessionState::new(state.session_id.clone());
        fresh.created_at = state.created_at;
        fresh.caller_name = state.caller_name.clone();
        fresh.caller_gender = state.caller_gender.clone();
        fresh.push(Turn::user(summary));
        if let Some(reply) = last_reply {
            fresh.push(reply);
        }

        *state = fresh;
        Step::Done
    }

    /// Build the plain-text transcript (final turns only) and ask the
    /// model for a condensed narrative. The summary always carries the
    /// recognizable prefix; on failure the reset still happens with a
    /// fallback seed.
    async fn summarize(&self, state: &SessionState) -> String {
        let transcript: Vec<String> = state
            .history
            .iter()
            .filter_map(|turn| match turn {
                Turn::User { content } => Some(format!("Пользователь: {content}")),
                Turn::Assistant { content } => Some(format!("Ассистент: {content}")),
                Turn::ToolInvocation { .. } | Turn::ToolResult { .. } => None,
            })
            .collect();

        let messages = vec![
            PromptMessage::system(SUMMARIZE_CONVERSATION_PROMPT),
            PromptMessage::user(format!(
                "Вот диалог для обобщения:\n\n{}",
                transcript.join("\n")
            )),
        ];

        match self.model.invoke(&messages).await {
            Ok(raw) => {
                let trimmed = raw.trim();
                if trimmed.starts_with(SUMMARY_PREFIX) {
                    trimmed.to_string()
                } else {
                    format!("{SUMMARY_PREFIX}\n{trimmed}")
                }
            }
            Err(e) => {
                error!("[{}] summarize failed: {e}", prefix(&state.session_id));
                SUMMARY_FAILURE_TEXT.to_string()
            }
        }
    }
}
