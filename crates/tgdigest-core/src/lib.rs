//! Core domain + pipeline for the Telegram channel digest.
//!
//! This crate is intentionally framework-agnostic. Telegram (MTProto / Bot API)
//! and OpenAI live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod model;
pub mod pipeline;

pub use errors::{Error, Result};
