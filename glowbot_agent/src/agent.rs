//! The state machine driver.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

use glowbot_core::prompts::GENERIC_APOLOGY;
use glowbot_core::state::load_or_create;
use glowbot_core::{ChatModel, DocumentIndex, SessionState, SessionStore, ToolSpec, Turn};

use crate::retrieve;

/// Orchestrator tunables. The defaults mirror the values the system has
/// always run with; they are surfaced here rather than hard-coded because
/// no documented rationale pins them down.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Finalized assistant turns before a summarize-and-reset.
    pub summary_threshold: usize,
    /// Matches fetched per retrieval sub-query.
    pub retrieval_top_k: usize,
    /// Hard cap on state transitions within one turn.
    pub max_transitions: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            summary_threshold: 10,
            retrieval_top_k: 5,
            max_transitions: 10,
        }
    }
}

/// Named states of the per-turn machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Extract caller name/gender until both are known.
    Identify,
    /// Decide whether this turn needs knowledge retrieval.
    Classify,
    /// Produce either a tool invocation or the final reply.
    Compose,
    /// Execute a pending tool invocation, or fall through.
    Act,
    /// Summarize-and-reset long sessions.
    Lifecycle,
    Done,
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("turn aborted: transition cap of {0} exceeded")]
    TransitionCapExceeded(usize),
}

pub struct ConsultationAgent {
    pub(crate) model: Arc<dyn ChatModel>,
    pub(crate) index: Arc<dyn DocumentIndex>,
    store: Arc<dyn SessionStore>,
    pub(crate) config: AgentConfig,
    pub(crate) retrieval_tool: ToolSpec,
}

impl ConsultationAgent {
    #[must_use]
    pub fn new(
        model: Arc<dyn ChatModel>,
        index: Arc<dyn DocumentIndex>,
        store: Arc<dyn SessionStore>,
        config: AgentConfig,
    ) -> Self {
        Self {
            model,
            index,
            store,
            config,
            retrieval_tool: ToolSpec::rag_search(),
        }
    }

    /// Handle one inbound message for `session_id` and return the updated
    /// state. Never fails toward the caller: internal errors end as a
    /// generic apology turn.
    ///
    /// Callers must serialize invocations per session id (see
    /// `glowbot_core::SessionLocks`); the state itself has no locking.
    pub async fn handle_message(&self, session_id: &str, text: &str) -> SessionState {
        let mut state = match load_or_create(self.store.as_ref(), session_id).await {
            Ok(state) => state,
            Err(e) => {
                error!("[{}] failed to load session: {e}", prefix(session_id));
                SessionState::new(session_id)
            }
        };

        state.push(Turn::user(text));

        if let Err(e) = self.drive(&mut state).await {
            error!("[{}] turn failed: {e}", prefix(session_id));
            state.push(Turn::assistant(GENERIC_APOLOGY));
        }

        if let Err(e) = self.store.save(&state).await {
            // The reply is still worth returning; only persistence is lost.
            error!("[{}] failed to save session: {e}", prefix(session_id));
        }

        state
    }

    /// Run the machine to `Done`, bounded by the transition cap.
    pub(crate) async fn drive(&self, state: &mut SessionState) -> Result<(), AgentError> {
        let mut step = Step::Identify;
        let mut transitions = 0_usize;

        while step != Step::Done {
            transitions += 1;
            if transitions > self.config.max_transitions {
                return Err(AgentError::TransitionCapExceeded(
                    self.config.max_transitions,
                ));
            }
            debug!("[{}] step {:?}", prefix(&state.session_id), step);

            step = match step {
                Step::Identify => self.identify(state).await,
                Step::Classify => self.classify(state).await,
                Step::Compose => self.compose(state).await,
                Step::Act => self.act(state).await,
                Step::Lifecycle => self.lifecycle(state).await,
                Step::Done => Step::Done,
            };
        }
        Ok(())
    }

    /// Execute a pending tool invocation; otherwise the turn is ready for
    /// the lifecycle check.
    pub(crate) async fn act(&self, state: &mut SessionState) -> Step {
        let pending_query = match state.last_turn() {
            Some(Turn::ToolInvocation { query, .. }) => Some(query.clone()),
            _ => None,
        };

        if let Some(query) = pending_query {
            let result =
                retrieve::run_search(self.index.as_ref(), &query, self.config.retrieval_top_k)
                    .await;
            state.push(Turn::tool_result(result));
            Step::Compose
        } else {
            Step::Lifecycle
        }
    }
}

/// Session-id prefix for log lines.
pub(crate) fn prefix(session_id: &str) -> &str {
    let end = session_id
        .char_indices()
        .nth(12)
        .map_or(session_id.len(), |(i, _)| i);
    &session_id[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_bounded_and_utf8_safe() {
        assert_eq!(prefix("telegram:42"), "telegram:42");
        assert_eq!(prefix("talkme:0123456789abcdef"), "talkme:01234");
        // Must not split a multibyte char.
        assert_eq!(prefix("сессия-клиента"), "сессия-клиен");
    }
}
