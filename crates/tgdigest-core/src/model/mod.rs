//! Provider-agnostic generative-service types and port.

pub mod client;
pub mod types;
