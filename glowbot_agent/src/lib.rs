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
    clippy::missing_errors_doc
)]

//! Consultation orchestrator.
//!
//! One inbound user message drives the session through an explicit state
//! machine: Identify -> Classify -> Compose -> Act (looping back to
//! Compose after a tool execution) -> Lifecycle -> Done. Every step
//! degrades on failure instead of propagating; the caller always gets a
//! state back with at least one new assistant-authored turn.

mod agent;
mod classify;
mod compose;
mod identify;
mod lifecycle;
pub mod retrieve;

pub use agent::{AgentConfig, AgentError, ConsultationAgent, Step};
