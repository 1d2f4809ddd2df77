#![warn(
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
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

//! Knowledge base: document storage, similarity search, ingestion, and
//! session persistence.
//!
//! The index keeps one row per chunk with its embedding stored as JSON;
//! search embeds the query and scores every chunk in process. That is fine
//! at salon-knowledge-base scale (hundreds of chunks) and keeps the
//! database schema plain.

mod convert;
pub mod index;
pub mod ingest;
pub mod regen;
pub mod scoring;
pub mod store;

pub use index::SeaOrmDocumentIndex;
pub use ingest::{IngestReport, Ingestor};
pub use regen::{DirRebuilder, KnowledgeRebuilder, RegenOutcome, RegenerationManager};
pub use store::{InMemorySessionStore, SeaOrmSessionStore};
