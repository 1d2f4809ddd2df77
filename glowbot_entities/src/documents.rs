//! `documents` table: one row per knowledge-base chunk.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// File the chunk came from, kept for source tags in search results.
    pub source: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// Embedding vector stored as a JSON array of floats.
    pub embedding: Option<Json>,
    /// SHA-256 of the chunk content, used for ingest dedup.
    #[sea_orm(unique)]
    pub content_hash: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
