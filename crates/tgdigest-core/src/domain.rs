use std::{fmt, str::FromStr};

use crate::{errors::Error, Result};

/// A configured source channel (`@handle` or bare handle as written in config).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Channel(String);

impl Channel {
    /// Trims the identifier; blank identifiers are rejected.
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::Config("channel identifier is empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Handle without the leading `@`, as used in public permalinks.
    pub fn handle(&self) -> &str {
        self.0.strip_prefix('@').unwrap_or(&self.0)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One post as returned by the platform's history call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawPost {
    pub id: i32,
    /// Unix seconds. Posts without a date are discarded by the normalizer.
    pub timestamp: Option<i64>,
    pub body: Option<String>,
    pub views: Option<u64>,
    /// Per-kind reaction counts; summed during normalization.
    pub reactions: Option<Vec<u64>>,
}

/// Where the finished digest goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    /// `@name` or `name`; stored without the `@`.
    Handle(String),
    /// Numeric chat id, either bare or in `-100…` channel form.
    Id(i64),
}

/// Peer id with the Bot API `-100` channel prefix and the sign removed.
///
/// MTProto addresses channels by this bare id.
pub fn bare_chat_id(id: i64) -> i64 {
    let text = id.to_string();
    match text.strip_prefix("-100") {
        Some(rest) if !rest.is_empty() => rest.parse().unwrap_or(id.saturating_abs()),
        _ => id.saturating_abs(),
    }
}

impl Destination {
    /// [`bare_chat_id`] of a numeric destination; `None` for handles.
    pub fn bare_id(&self) -> Option<i64> {
        match self {
            Destination::Id(id) => Some(bare_chat_id(*id)),
            Destination::Handle(_) => None,
        }
    }
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::Config("destination chat id is empty".to_string()));
        }
        if let Ok(id) = s.parse::<i64>() {
            return Ok(Destination::Id(id));
        }
        let handle = s.strip_prefix('@').unwrap_or(s);
        if handle.is_empty() || handle.contains(char::is_whitespace) {
            return Err(Error::Config(format!("invalid destination: {s}")));
        }
        Ok(Destination::Handle(handle.to_string()))
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Handle(h) => write!(f, "@{h}"),
            Destination::Id(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_is_trimmed_and_rejects_blank() {
        let c = Channel::new("  @alpha ").unwrap();
        assert_eq!(c.as_str(), "@alpha");
        assert_eq!(c.handle(), "alpha");
        assert!(Channel::new("   ").is_err());
    }

    #[test]
    fn destination_parses_handles_and_ids() {
        assert_eq!(
            "@digest".parse::<Destination>().unwrap(),
            Destination::Handle("digest".to_string())
        );
        assert_eq!(
            "-1001234567".parse::<Destination>().unwrap(),
            Destination::Id(-1001234567)
        );
        assert!("".parse::<Destination>().is_err());
        assert!("two words".parse::<Destination>().is_err());
    }

    #[test]
    fn bare_id_strips_channel_prefix() {
        assert_eq!(Destination::Id(-1001234567).bare_id(), Some(1234567));
        assert_eq!(Destination::Id(42).bare_id(), Some(42));
        assert_eq!(Destination::Id(-42).bare_id(), Some(42));
        assert_eq!(Destination::Handle("x".into()).bare_id(), None);
    }

    #[test]
    fn bare_chat_id_handles_edge_values() {
        assert_eq!(bare_chat_id(-1001234567), 1234567);
        assert_eq!(bare_chat_id(-100), 100);
        assert_eq!(bare_chat_id(i64::MIN), i64::MAX);
    }
}
