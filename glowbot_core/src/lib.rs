#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod locks;
pub mod prompts;
pub mod reply;
pub mod state;
pub mod tool;
pub mod turn;

pub use locks::SessionLocks;
pub use reply::{ComposedReply, parse_composed_reply};
pub use state::{ClassificationFlags, SessionState};
pub use tool::{RAG_SEARCH_TOOL, ToolInvocation, ToolSpec};
pub use turn::Turn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
        }
    }
}

/// A scored knowledge-base passage returned by [`DocumentIndex::search`].
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub content: String,
    pub source: String,
    pub score: f64,
}

/// Hosted chat model. Latency and failure modes are opaque; callers are
/// expected to degrade gracefully rather than propagate.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn invoke(&self, messages: &[PromptMessage]) -> anyhow::Result<String>;

    /// Variant that constrains the model to call exactly one tool and
    /// returns the resulting invocation instead of free text.
    async fn invoke_with_forced_tool(
        &self,
        messages: &[PromptMessage],
        tool: &ToolSpec,
    ) -> anyhow::Result<ToolInvocation>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Similarity search over the knowledge base. Index construction and
/// persistence live behind this boundary.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    async fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<ScoredDocument>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> anyhow::Result<Option<SessionState>>;
    async fn save(&self, state: &SessionState) -> anyhow::Result<()>;
    async fn clear(&self, session_id: &str) -> anyhow::Result<()>;
}
