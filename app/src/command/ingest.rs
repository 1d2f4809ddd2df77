use glowbot_config::Config;
use glowbot_knowledge::{DirRebuilder, Ingestor, RegenOutcome, RegenerationManager};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::command::{CommandStrategy, build_provider, connect_database_with_retry};

/// Input for the knowledge-base rebuild command.
pub struct IngestInput {
    /// Directory with knowledge files (overrides config).
    pub path: Option<String>,
}

/// Strategy for rebuilding the knowledge base.
pub struct IngestStrategy;

impl CommandStrategy for IngestStrategy {
    type Input = IngestInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        let files_path = PathBuf::from(
            input
                .path
                .unwrap_or_else(|| config.knowledge.files_path.clone()),
        );
        if !files_path.is_dir() {
            anyhow::bail!("Knowledge directory not found: {}", files_path.display());
        }

        let provider = build_provider(&config);
        let db = connect_database_with_retry(&config.database.url).await;

        let ingestor =
            Ingestor::new(db, provider).with_max_chunk_chars(config.knowledge.max_chunk_chars);
        let manager = RegenerationManager::new(
            DirRebuilder::new(ingestor, files_path),
            Duration::from_secs(config.knowledge.min_rebuild_interval_secs),
        );

        info!("Rebuilding knowledge base...");
        match manager.regenerate("cli").await {
            RegenOutcome::Completed(report) => {
                println!(
                    "Knowledge base rebuilt: {} files, {} chunks added, {} skipped",
                    report.files, report.chunks_added, report.chunks_skipped
                );
                Ok(())
            }
            RegenOutcome::InProgress => anyhow::bail!("A rebuild is already in progress"),
            RegenOutcome::Skipped => anyhow::bail!("Rebuild skipped: last one finished too recently"),
            RegenOutcome::Failed(e) => anyhow::bail!("Rebuild failed: {e}"),
        }
    }
}
