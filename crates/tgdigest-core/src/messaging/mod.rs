//! Messaging-platform ports (Telegram today).

pub mod port;
