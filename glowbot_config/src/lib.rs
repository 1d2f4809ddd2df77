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

//! Configuration loaded from `~/glowbot/config.json`.

mod schema;

pub use schema::{
    AgentTunables, Config, DatabaseConfig, KnowledgeConfig, ProviderConfig, ProvidersConfig,
    TelegramConfig, WebhookConfig,
};
