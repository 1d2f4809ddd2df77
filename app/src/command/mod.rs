//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type, dispatched
//! statically. The shared wiring (provider, database, agent) lives here so
//! every long-running command builds the same runtime.

use glowbot_agent::{AgentConfig, ConsultationAgent};
use glowbot_config::Config;
use glowbot_core::SessionStore;
use glowbot_knowledge::{SeaOrmDocumentIndex, SeaOrmSessionStore};
use glowbot_providers::OpenAiProvider;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

mod chat;
mod ingest;
mod init;
mod serve;
mod telegram;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use ingest::{IngestInput, IngestStrategy};
pub use init::InitStrategy;
pub use serve::ServeStrategy;
pub use telegram::{TelegramInput, TelegramStrategy};
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
///
/// Each strategy defines its own input type via an associated type, so
/// parameters pass type-safely without boxing or runtime casting.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Everything a long-running command needs.
pub(crate) struct Runtime {
    pub agent: Arc<ConsultationAgent>,
    pub store: Arc<dyn SessionStore>,
}

/// Connect to the database with backoff: 1s, 2s, then 3s capped,
/// retrying indefinitely until the connection succeeds.
pub(crate) async fn connect_database_with_retry(database_url: &str) -> DatabaseConnection {
    const MAX_DELAY: Duration = Duration::from_secs(3);
    const INITIAL_DELAY: Duration = Duration::from_secs(1);

    let mut attempt = 0_u32;
    let mut delay = INITIAL_DELAY;

    loop {
        attempt += 1;
        match Database::connect(database_url).await {
            Ok(db) => {
                info!("Database connected on attempt {attempt}");
                return db;
            }
            Err(e) => {
                warn!(
                    "Failed to connect to database (attempt {attempt}): {e}. Retrying in {}s...",
                    delay.as_secs()
                );
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

pub(crate) fn build_provider(config: &Config) -> Arc<OpenAiProvider> {
    let openai = &config.providers.openai;
    let mut provider = OpenAiProvider::new(openai.api_key.clone(), openai.model.clone())
        .with_embedding_model(openai.embedding_model.clone())
        .with_temperature(openai.temperature);
    if let Some(base_url) = &openai.base_url {
        provider = provider.with_base_url(base_url.clone());
    }
    Arc::new(provider)
}

/// Wire provider, index, store, and orchestrator from config.
pub(crate) async fn build_runtime(config: &Config) -> Runtime {
    let provider = build_provider(config);
    let db = connect_database_with_retry(&config.database.url).await;

    let index = Arc::new(SeaOrmDocumentIndex::new(db.clone(), provider.clone()));
    let store: Arc<dyn SessionStore> = Arc::new(SeaOrmSessionStore::new(db));

    let agent_config = AgentConfig {
        summary_threshold: config.agent.summary_threshold,
        retrieval_top_k: config.agent.retrieval_top_k,
        max_transitions: config.agent.max_transitions,
    };

    info!(
        "Agent config: summary_threshold={}, retrieval_top_k={}, max_transitions={}",
        agent_config.summary_threshold, agent_config.retrieval_top_k, agent_config.max_transitions
    );

    let agent = Arc::new(ConsultationAgent::new(
        provider,
        index,
        Arc::clone(&store),
        agent_config,
    ));

    Runtime { agent, store }
}
