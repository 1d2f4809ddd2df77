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

//! Webhook channel adapter for the chat platform.
//!
//! Inbound: one POST per client message, in the platform's webhook JSON.
//! Outbound: bot-API calls to send the reply, simulate typing, and report
//! service codes. Classification signals travel as structured flags on the
//! session state, never as string scanning over reply text.

mod client;
mod error;
mod payload;
mod server;

pub use client::PlatformClient;
pub use error::Error;
pub use payload::InboundMessage;
pub use server::{AppState, router, serve};

/// Service code incrementing the platform's off-topic counter.
pub const CODE_IRRELEVANT: &str = "IRRELEVANT_MESSAGE";
/// Service code switching the dialog to a human operator.
pub const CODE_OPERATOR: &str = "OPERATOR_REQUEST";
