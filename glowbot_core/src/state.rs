//! Session state.
//!
//! One `SessionState` per end-user conversation, keyed by an opaque
//! channel-scoped id (`"telegram:12345"`, `"talkme:<dialog>"`). The record
//! replaces the loosely-typed per-user dictionaries of earlier iterations:
//! every field is named, typed, and explicitly optional.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::turn::Turn;
use crate::{PromptMessage, SessionStore};

/// Per-turn classification outputs. Transient: recomputed whenever the
/// composer produces a final reply, meaningful to channel adapters only.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassificationFlags {
    /// The question was off-topic for the salon context.
    pub irrelevant: bool,
    /// The caller asked to be handed off to a human operator.
    pub wants_operator: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    /// Recomputed each turn by the classifier; `true` on creation so a
    /// classifier failure can never suppress retrieval.
    pub needs_retrieval: bool,
    pub caller_name: Option<String>,
    pub caller_gender: Option<String>,
    /// Literal conversation transcript, insertion-ordered.
    pub history: Vec<Turn>,
    #[serde(default)]
    pub flags: ClassificationFlags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            needs_retrieval: true,
            caller_name: None,
            caller_gender: None,
            history: Vec::new(),
            flags: ClassificationFlags::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.history.push(turn);
        self.updated_at = Utc::now();
    }

    #[must_use]
    pub fn last_turn(&self) -> Option<&Turn> {
        self.history.last()
    }

    /// Text of the most recent finalized assistant reply, skipping tool
    /// invocations and tool results.
    #[must_use]
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|t| t.is_assistant())
            .and_then(Turn::text)
    }

    /// Text of the most recent user message.
    #[must_use]
    pub fn last_user_text(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|t| t.is_user())
            .and_then(Turn::text)
    }

    /// Number of finalized assistant turns, the lifecycle trigger metric.
    #[must_use]
    pub fn finalized_assistant_count(&self) -> usize {
        self.history.iter().filter(|t| t.is_assistant()).count()
    }

    #[must_use]
    pub const fn profile_complete(&self) -> bool {
        self.caller_name.is_some() && self.caller_gender.is_some()
    }

    /// Fold extracted profile fields into the state. Fields are
    /// write-once: an already-set field is never overwritten, a missing
    /// extraction never clears one.
    pub fn merge_profile(&mut self, name: Option<String>, gender: Option<String>) {
        if self.caller_name.is_none() {
            self.caller_name = name;
        }
        if self.caller_gender.is_none() {
            self.caller_gender = gender;
        }
    }

    /// Transcript as prompt messages, tool traffic excluded.
    #[must_use]
    pub fn chat_history(&self) -> Vec<PromptMessage> {
        self.history
            .iter()
            .filter_map(Turn::as_prompt_message)
            .collect()
    }
}

/// Load the session for `session_id`, creating a fresh one on first
/// contact.
pub async fn load_or_create(
    store: &dyn SessionStore,
    session_id: &str,
) -> anyhow::Result<SessionState> {
    match store.load(session_id).await? {
        Some(state) => Ok(state),
        None => Ok(SessionState::new(session_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_defaults() {
        let state = SessionState::new("telegram:1");
        assert!(state.needs_retrieval);
        assert!(state.caller_name.is_none());
        assert!(state.caller_gender.is_none());
        assert!(state.history.is_empty());
        assert_eq!(state.flags, ClassificationFlags::default());
    }

    #[test]
    fn profile_fields_are_write_once() {
        let mut state = SessionState::new("s");
        state.merge_profile(Some("Анна".to_string()), None);
        assert_eq!(state.caller_name.as_deref(), Some("Анна"));
        assert!(!state.profile_complete());

        // A later extraction fills the gap but never overwrites.
        state.merge_profile(Some("Мария".to_string()), Some("женский".to_string()));
        assert_eq!(state.caller_name.as_deref(), Some("Анна"));
        assert_eq!(state.caller_gender.as_deref(), Some("женский"));
        assert!(state.profile_complete());

        state.merge_profile(None, None);
        assert_eq!(state.caller_name.as_deref(), Some("Анна"));
        assert_eq!(state.caller_gender.as_deref(), Some("женский"));
    }

    #[test]
    fn finalized_count_ignores_tool_turns() {
        let mut state = SessionState::new("s");
        state.push(Turn::user("вопрос"));
        state.push(Turn::ToolInvocation {
            tool: "rag_search".to_string(),
            query: "массаж".to_string(),
        });
        state.push(Turn::tool_result("данные"));
        state.push(Turn::assistant("ответ"));
        assert_eq!(state.finalized_assistant_count(), 1);
    }

    #[test]
    fn chat_history_excludes_tool_traffic() {
        let mut state = SessionState::new("s");
        state.push(Turn::user("вопрос"));
        state.push(Turn::ToolInvocation {
            tool: "rag_search".to_string(),
            query: "массаж".to_string(),
        });
        state.push(Turn::tool_result("данные"));
        state.push(Turn::assistant("ответ"));
        assert_eq!(state.chat_history().len(), 2);
    }

    #[test]
    fn last_assistant_text_skips_tool_results() {
        let mut state = SessionState::new("s");
        state.push(Turn::user("вопрос"));
        state.push(Turn::assistant("ответ"));
        state.push(Turn::tool_result("шум"));
        assert_eq!(state.last_assistant_text(), Some("ответ"));
    }
}
