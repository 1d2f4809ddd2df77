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

//! Telegram channel adapter: teloxide dispatcher around the consultation
//! agent.

mod bot;
mod command;
mod error;
mod handler;

pub use bot::SalonBot;
pub use command::Command;
pub use error::{Error, Result};
