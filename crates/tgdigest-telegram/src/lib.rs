//! Telegram adapters.
//!
//! - [`mtproto::MtprotoClient`]: user session over MTProto (`grammers`); reads
//!   channel history and can post the digest.
//! - [`bot::BotSink`]: optional Bot API sender (`teloxide`), HTML parse mode.

pub mod bot;
pub mod mtproto;

pub use bot::BotSink;
pub use mtproto::{MtprotoClient, MtprotoConfig};
