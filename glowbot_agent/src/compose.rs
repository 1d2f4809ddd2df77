//! Compose step: tool invocation or final answer.

use tracing::{error, warn};

use glowbot_core::prompts::{
    CONSULTATION_PROMPT, GENERIC_APOLOGY, NO_RETRIEVAL_PLACEHOLDER, RAG_PROMPT,
};
use glowbot_core::reply::parse_composed_reply;
use glowbot_core::{PromptMessage, SessionState, Turn};

use crate::agent::{ConsultationAgent, Step, prefix};

impl ConsultationAgent {
    /// Two mutually exclusive branches, selected by the shape of the last
    /// turn and the retrieval flag. Either way control passes to `Act`,
    /// which routes on whatever got appended.
    pub(crate) async fn compose(&self, state: &mut SessionState) -> Step {
        enum Branch {
            ForcedRetrieval,
            FinalAnswer,
            Skip,
        }

        let branch = match state.last_turn() {
            Some(Turn::User { .. }) if state.needs_retrieval => Branch::ForcedRetrieval,
            Some(Turn::User { .. } | Turn::ToolResult { .. }) => Branch::FinalAnswer,
            _ => Branch::Skip,
        };

        match branch {
            Branch::ForcedRetrieval => self.compose_forced_retrieval(state).await,
            Branch::FinalAnswer => self.compose_final(state).await,
            Branch::Skip => {}
        }
        Step::Act
    }

    /// Force the model to request the retrieval tool; the invocation (not
    /// yet an answer) is appended to history.
    async fn compose_forced_retrieval(&self, state: &mut SessionState) {
        let mut messages = vec![PromptMessage::system(RAG_PROMPT)];
        messages.extend(state.chat_history());
        messages.push(PromptMessage::user("Выполни поиск по запросу пользователя"));

        match self
            .model
            .invoke_with_forced_tool(&messages, &self.retrieval_tool)
            .await
        {
            Ok(invocation) => {
                let query = invocation.query().map_or_else(
                    || {
                        warn!(
                            "[{}] compose: tool call without user_query, falling back to message text",
                            prefix(&state.session_id)
                        );
                        state.last_user_text().unwrap_or_default().to_string()
                    },
                    ToString::to_string,
                );
                state.push(Turn::ToolInvocation {
                    tool: invocation.tool,
                    query,
                });
            }
            Err(e) => {
                error!(
                    "[{}] compose (forced tool) failed: {e}",
                    prefix(&state.session_id)
                );
                state.push(Turn::assistant(GENERIC_APOLOGY));
            }
        }
    }

    /// Produce the user-facing reply from history, retrieved passages (or
    /// the no-retrieval placeholder), and the caller's profile.
    async fn compose_final(&self, state: &mut SessionState) {
        let retrieved = match state.last_turn() {
            Some(Turn::ToolResult { content }) => content.clone(),
            _ => NO_RETRIEVAL_PLACEHOLDER.to_string(),
        };
        let user_query = state
            .last_user_text()
            .unwrap_or("последний запрос")
            .to_string();
        let client_name = state.caller_name.clone().unwrap_or_else(|| "клиент".to_string());
        let gender = state
            .caller_gender
            .clone()
            .unwrap_or_else(|| "неизвестен".to_string());

        let system = CONSULTATION_PROMPT
            .replace("{client_name}", &client_name)
            .replace("{gender}", &gender);

        let mut messages = vec![PromptMessage::system(system)];
        messages.extend(state.chat_history());
        messages.push(PromptMessage::user(format!(
            "Запрос пользователя: '{user_query}'\n\n\
             Релевантная информация:\n{retrieved}\n\n\
             Сформулируй финальный ответ пользователю на основе этой информации."
        )));

        match self.model.invoke(&messages).await {
            Ok(raw) => {
                let parsed = parse_composed_reply(&raw);
                state.flags = parsed.flags;
                state.push(Turn::assistant(parsed.text));
            }
            Err(e) => {
                error!(
                    "[{}] compose (final) failed: {e}",
                    prefix(&state.session_id)
                );
                state.push(Turn::assistant(GENERIC_APOLOGY));
            }
        }
    }
}
