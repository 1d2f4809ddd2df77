//! Conversation turns.
//!
//! A turn is one role-tagged entry in the session transcript. Tool
//! invocations and tool results are first-class variants rather than
//! assistant messages with side-channel metadata, so "finalized assistant
//! reply" is simply the `Assistant` variant.

use serde::{Deserialize, Serialize};

use crate::prompts::SUMMARY_PREFIX;
use crate::{PromptMessage, PromptRole};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    User { content: String },
    Assistant { content: String },
    ToolInvocation { tool: String, query: String },
    ToolResult { content: String },
}

impl Turn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
        }
    }

    #[must_use]
    pub fn tool_result(content: impl Into<String>) -> Self {
        Self::ToolResult {
            content: content.into(),
        }
    }

    #[must_use]
    pub const fn is_user(&self) -> bool {
        matches!(self, Self::User { .. })
    }

    /// True for finalized assistant replies. Tool invocations are not
    /// final even though they are assistant-authored.
    #[must_use]
    pub const fn is_assistant(&self) -> bool {
        matches!(self, Self::Assistant { .. })
    }

    #[must_use]
    pub const fn is_tool_invocation(&self) -> bool {
        matches!(self, Self::ToolInvocation { .. })
    }

    #[must_use]
    pub const fn is_tool_result(&self) -> bool {
        matches!(self, Self::ToolResult { .. })
    }

    /// Text content for the plain-message variants.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::User { content } | Self::Assistant { content } | Self::ToolResult { content } => {
                Some(content)
            }
            Self::ToolInvocation { .. } => None,
        }
    }

    /// A lifecycle reset seeds the replacement history with the summary
    /// tagged as a user turn carrying a recognizable prefix.
    #[must_use]
    pub fn is_summary_seed(&self) -> bool {
        matches!(self, Self::User { content } if content.starts_with(SUMMARY_PREFIX))
    }

    /// Map a transcript turn onto a prompt message, skipping tool traffic.
    #[must_use]
    pub fn as_prompt_message(&self) -> Option<PromptMessage> {
        match self {
            Self::User { content } => Some(PromptMessage {
                role: PromptRole::User,
                content: content.clone(),
            }),
            Self::Assistant { content } => Some(PromptMessage {
                role: PromptRole::Assistant,
                content: content.clone(),
            }),
            Self::ToolInvocation { .. } | Self::ToolResult { .. } => None,
        }
    }
}
