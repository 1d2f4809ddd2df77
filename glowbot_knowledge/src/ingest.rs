//! Knowledge-base ingestion: directory scan, chunking, embedding, storage.
//!
//! Plain-text and markdown files only. Chunks are paragraphs packed up to
//! a character bound; each chunk is deduplicated by content hash so
//! re-ingesting unchanged files is cheap.

use chrono::Utc;
use glowbot_core::Embedder;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use glowbot_entities::documents;

use crate::convert;

/// Upper bound on one chunk, in characters.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1500;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files: usize,
    pub chunks_added: usize,
    pub chunks_skipped: usize,
}

/// Pack paragraphs into chunks of at most `max_chars` characters.
/// A single oversized paragraph becomes its own chunk rather than being
/// split mid-sentence.
#[must_use]
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        if !current.is_empty() && current.chars().count() + paragraph.chars().count() > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn content_hash(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

pub struct Ingestor {
    db: DatabaseConnection,
    embedder: Arc<dyn Embedder>,
    max_chunk_chars: usize,
}

impl Ingestor {
    #[must_use]
    pub const fn new(db: DatabaseConnection, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            db,
            embedder,
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }

    #[must_use]
    pub const fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars;
        self
    }

    /// Ingest every supported file under `folder`, skipping chunks whose
    /// hash is already stored.
    pub async fn ingest_dir(&self, folder: &Path) -> anyhow::Result<IngestReport> {
        let mut report = IngestReport::default();

        let mut entries: Vec<_> = std::fs::read_dir(folder)?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("txt" | "md")
                )
            })
            .collect();
        entries.sort();

        for path in entries {
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping unreadable file {}: {e}", path.display());
                    continue;
                }
            };
            let source = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();

            report.files += 1;
            for chunk in split_into_chunks(&text, self.max_chunk_chars) {
                if self.store_chunk(&source, &chunk).await? {
                    report.chunks_added += 1;
                } else {
                    report.chunks_skipped += 1;
                }
            }
        }

        info!(
            "Ingest of {} complete: {} files, {} chunks added, {} skipped",
            folder.display(),
            report.files,
            report.chunks_added,
            report.chunks_skipped
        );
        Ok(report)
    }

    /// Full rebuild: drop every stored chunk, then ingest the folder from
    /// scratch.
    pub async fn rebuild(&self, folder: &Path) -> anyhow::Result<IngestReport> {
        let deleted = documents::Entity::delete_many().exec(&self.db).await?;
        info!("Rebuild: removed {} existing chunks", deleted.rows_affected);
        self.ingest_dir(folder).await
    }

    /// Returns `true` if the chunk was inserted, `false` on a hash hit.
    async fn store_chunk(&self, source: &str, content: &str) -> anyhow::Result<bool> {
        let hash = content_hash(content);

        let existing = documents::Entity::find()
            .filter(documents::Column::ContentHash.eq(&hash))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        let embedding = self.embedder.embed(content).await?;

        let model = documents::ActiveModel {
            id: Set(Uuid::now_v7()),
            source: Set(source.to_string()),
            content: Set(content.to_string()),
            embedding: Set(Some(convert::embedding_to_json(&embedding))),
            content_hash: Set(hash),
            created_at: Set(Utc::now()),
        };
        model.insert(&self.db).await?;
        Ok(true)
    }
}
