//! Regeneration coordination for the knowledge base.
//!
//! Full rebuilds can be triggered from several places; this manager
//! enforces at-most-one concurrent rebuild and a minimum interval between
//! completed rebuilds. It is an injected object with an explicit
//! lifecycle, constructed once at process start.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::ingest::{IngestReport, Ingestor};

/// The actual rebuild work, behind a seam so coordination is testable
/// without a database.
#[async_trait]
pub trait KnowledgeRebuilder: Send + Sync {
    async fn rebuild(&self) -> anyhow::Result<IngestReport>;
}

/// Rebuilds by wiping and re-ingesting one directory.
pub struct DirRebuilder {
    ingestor: Ingestor,
    files_path: PathBuf,
}

impl DirRebuilder {
    #[must_use]
    pub const fn new(ingestor: Ingestor, files_path: PathBuf) -> Self {
        Self {
            ingestor,
            files_path,
        }
    }
}

#[async_trait]
impl KnowledgeRebuilder for DirRebuilder {
    async fn rebuild(&self) -> anyhow::Result<IngestReport> {
        self.ingestor.rebuild(&self.files_path).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegenOutcome {
    Completed(IngestReport),
    /// Another rebuild is currently running.
    InProgress,
    /// A rebuild completed too recently.
    Skipped,
    Failed(String),
}

struct RegenState {
    is_regenerating: bool,
    last_completed: Option<Instant>,
}

pub struct RegenerationManager<R = DirRebuilder> {
    rebuilder: R,
    min_interval: Duration,
    state: Mutex<RegenState>,
}

impl<R: KnowledgeRebuilder> RegenerationManager<R> {
    #[must_use]
    pub fn new(rebuilder: R, min_interval: Duration) -> Self {
        Self {
            rebuilder,
            min_interval,
            state: Mutex::new(RegenState {
                is_regenerating: false,
                last_completed: None,
            }),
        }
    }

    /// Rebuild the knowledge base unless one is already running or one
    /// finished less than `min_interval` ago. `source` names the trigger
    /// for the logs.
    pub async fn regenerate(&self, source: &str) -> RegenOutcome {
        {
            let mut state = self.state.lock().await;
            if state.is_regenerating {
                warn!("Rebuild requested by {source} skipped: already in progress");
                return RegenOutcome::InProgress;
            }
            if let Some(last) = state.last_completed {
                if last.elapsed() < self.min_interval {
                    warn!("Rebuild requested by {source} skipped: too soon after the last one");
                    return RegenOutcome::Skipped;
                }
            }
            state.is_regenerating = true;
        }

        info!("Starting knowledge-base rebuild (source: {source})");
        let result = self.rebuilder.rebuild().await;

        let mut state = self.state.lock().await;
        state.is_regenerating = false;
        match result {
            Ok(report) => {
                state.last_completed = Some(Instant::now());
                info!(
                    "Knowledge-base rebuild finished: {} chunks from {} files (source: {source})",
                    report.chunks_added, report.files
                );
                RegenOutcome::Completed(report)
            }
            Err(e) => {
                warn!("Knowledge-base rebuild failed (source: {source}): {e}");
                RegenOutcome::Failed(e.to_string())
            }
        }
    }

    /// Whether a rebuild is currently running.
    pub async fn is_regenerating(&self) -> bool {
        self.state.lock().await.is_regenerating
    }
}
