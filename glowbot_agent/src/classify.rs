//! Classify step: does this turn need knowledge retrieval?

use tracing::error;

use glowbot_core::prompts::NEEDS_RAG_PROMPT;
use glowbot_core::{PromptMessage, SessionState};

use crate::agent::{ConsultationAgent, Step, prefix};

impl ConsultationAgent {
    /// One prompt round trip; the model answers with a literal `YES` when
    /// retrieval is needed. Any failure defaults to retrieval: doing too
    /// much work is safer than answering without the knowledge base.
    pub(crate) async fn classify(&self, state: &mut SessionState) -> Step {
        let Some(user_query) = state.last_user_text().map(ToString::to_string) else {
            state.needs_retrieval = true;
            return Step::Compose;
        };

        let messages = vec![
            PromptMessage::system(NEEDS_RAG_PROMPT),
            PromptMessage::user(user_query),
        ];

        match self.model.invoke(&messages).await {
            Ok(raw) => state.needs_retrieval = raw.contains("YES"),
            Err(e) => {
                error!("[{}] classify failed: {e}", prefix(&state.session_id));
                state.needs_retrieval = true;
            }
        }

        Step::Compose
    }
}
