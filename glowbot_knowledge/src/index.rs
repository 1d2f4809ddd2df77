//! Similarity search over the `documents` table.

use async_trait::async_trait;
use glowbot_core::{DocumentIndex, Embedder, ScoredDocument};
use rayon::prelude::*;
use sea_orm::{DatabaseConnection, EntityTrait};
use std::sync::Arc;
use tracing::info;

use glowbot_entities::documents;

use crate::convert;
use crate::scoring::cosine_similarity;

/// Database-backed [`DocumentIndex`]: embeds the query, scores every
/// stored chunk with cosine similarity, returns the top `k`.
pub struct SeaOrmDocumentIndex {
    db: DatabaseConnection,
    embedder: Arc<dyn Embedder>,
}

impl SeaOrmDocumentIndex {
    #[must_use]
    pub const fn new(db: DatabaseConnection, embedder: Arc<dyn Embedder>) -> Self {
        Self { db, embedder }
    }
}

#[async_trait]
impl DocumentIndex for SeaOrmDocumentIndex {
    async fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<ScoredDocument>> {
        let query_embedding = self.embedder.embed(query).await?;

        let models = documents::Entity::find().all(&self.db).await?;
        let total = models.len();

        let mut scored: Vec<ScoredDocument> = models
            .into_par_iter()
            .filter_map(|model| {
                let embedding = model
                    .embedding
                    .as_ref()
                    .and_then(convert::embedding_from_json)?;
                Some(ScoredDocument {
                    score: cosine_similarity(&query_embedding, &embedding),
                    content: model.content,
                    source: model.source,
                })
            })
            .collect();

        scored.par_sort_unstable_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);

        info!(
            "Search '{}': {} of {} chunks returned",
            query,
            scored.len(),
            total
        );

        Ok(scored)
    }
}
