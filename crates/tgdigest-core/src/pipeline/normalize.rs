//! Raw post → normalized record (preview, permalink, metadata, recency cutoff).

use chrono::DateTime;

use crate::domain::{Channel, RawPost};

pub const PREVIEW_CHARS: usize = 50;
pub const PUBLIC_HOST: &str = "t.me";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedPost {
    pub id: i32,
    pub timestamp: i64,
    pub preview: String,
    pub permalink: String,
    /// `YYYY-MM-DD` (UTC).
    pub date: String,
    pub metadata: String,
    pub body: String,
}

impl NormalizedPost {
    /// Block fed to the generative service for this post.
    pub fn render(&self) -> String {
        format!(
            "[{}]({}) ({})\n{}\n{}",
            self.preview, self.permalink, self.date, self.metadata, self.body
        )
    }
}

/// Why a post did not make it into the aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    NoTimestamp,
    NoBody,
    TooOld,
}

/// Normalize one post, or say why it was dropped.
pub fn normalize_post(
    post: &RawPost,
    channel: &Channel,
    cutoff: i64,
) -> Result<NormalizedPost, Rejection> {
    let timestamp = post.timestamp.ok_or(Rejection::NoTimestamp)?;
    if timestamp < cutoff {
        return Err(Rejection::TooOld);
    }
    let body = post
        .body
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or(Rejection::NoBody)?;
    let date = DateTime::from_timestamp(timestamp, 0)
        .ok_or(Rejection::NoTimestamp)?
        .format("%Y-%m-%d")
        .to_string();

    let views = post.views.filter(|v| *v > 0);
    let reactions = post
        .reactions
        .as_ref()
        .map(|kinds| kinds.iter().sum::<u64>())
        .filter(|n| *n > 0);

    Ok(NormalizedPost {
        id: post.id,
        timestamp,
        preview: preview(body),
        permalink: permalink(channel, post.id),
        metadata: format!(
            "CHANNEL: {channel} | DATE: {date} | VIEWS: {} | REACTIONS: {}",
            or_na(views),
            or_na(reactions)
        ),
        date,
        body: body.to_string(),
    })
}

/// Normalize a channel's fetch, preserving the platform's (newest-first) order.
pub fn normalize_channel(posts: &[RawPost], channel: &Channel, cutoff: i64) -> Vec<NormalizedPost> {
    posts
        .iter()
        .filter_map(|post| match normalize_post(post, channel, cutoff) {
            Ok(n) => Some(n),
            Err(Rejection::TooOld) => {
                tracing::debug!(
                    channel = %channel,
                    post_id = post.id,
                    timestamp = ?post.timestamp,
                    "skipping old message"
                );
                None
            }
            Err(_) => None,
        })
        .collect()
}

/// First line of the body, cut to [`PREVIEW_CHARS`] characters.
pub fn preview(body: &str) -> String {
    let first = body.lines().next().unwrap_or("");
    if first.chars().count() > PREVIEW_CHARS {
        format!("{}...", first.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        first.to_string()
    }
}

pub fn permalink(channel: &Channel, post_id: i32) -> String {
    format!("https://{PUBLIC_HOST}/{}/{post_id}", channel.handle())
}

fn or_na(v: Option<u64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_else(|| "N/A".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUTOFF: i64 = 1_700_000_000;

    fn chan() -> Channel {
        Channel::new("@alpha").unwrap()
    }

    fn post(id: i32, ts: Option<i64>, body: Option<&str>) -> RawPost {
        RawPost {
            id,
            timestamp: ts,
            body: body.map(str::to_string),
            ..RawPost::default()
        }
    }

    #[test]
    fn keeps_posts_at_or_after_cutoff() {
        let at = post(1, Some(CUTOFF), Some("hello"));
        let before = post(2, Some(CUTOFF - 1), Some("hello"));
        assert!(normalize_post(&at, &chan(), CUTOFF).is_ok());
        assert_eq!(
            normalize_post(&before, &chan(), CUTOFF),
            Err(Rejection::TooOld)
        );
    }

    #[test]
    fn drops_posts_without_body_or_timestamp() {
        assert_eq!(
            normalize_post(&post(1, None, Some("x")), &chan(), CUTOFF),
            Err(Rejection::NoTimestamp)
        );
        assert_eq!(
            normalize_post(&post(1, Some(CUTOFF), None), &chan(), CUTOFF),
            Err(Rejection::NoBody)
        );
        assert_eq!(
            normalize_post(&post(1, Some(CUTOFF), Some("  \n ")), &chan(), CUTOFF),
            Err(Rejection::NoBody)
        );
    }

    #[test]
    fn builds_permalink_preview_and_metadata() {
        let raw = RawPost {
            id: 42,
            timestamp: Some(CUTOFF + 60),
            body: Some("Short title\nsecond line".to_string()),
            views: Some(1500),
            reactions: Some(vec![3, 4]),
        };
        let n = normalize_post(&raw, &chan(), CUTOFF).unwrap();
        assert_eq!(n.permalink, "https://t.me/alpha/42");
        assert_eq!(n.preview, "Short title");
        assert_eq!(n.date, "2023-11-14");
        assert_eq!(
            n.metadata,
            "CHANNEL: @alpha | DATE: 2023-11-14 | VIEWS: 1500 | REACTIONS: 7"
        );
        assert_eq!(
            n.render(),
            "[Short title](https://t.me/alpha/42) (2023-11-14)\n\
             CHANNEL: @alpha | DATE: 2023-11-14 | VIEWS: 1500 | REACTIONS: 7\n\
             Short title\nsecond line"
        );
    }

    #[test]
    fn missing_or_zero_counters_render_as_na() {
        let raw = RawPost {
            id: 1,
            timestamp: Some(CUTOFF),
            body: Some("x".to_string()),
            views: Some(0),
            reactions: None,
        };
        let n = normalize_post(&raw, &chan(), CUTOFF).unwrap();
        assert!(n.metadata.ends_with("VIEWS: N/A | REACTIONS: N/A"));
    }

    #[test]
    fn preview_truncates_long_first_line_by_chars() {
        let long = "я".repeat(60);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 3);
        assert!(p.ends_with("..."));
        assert_eq!(preview(&"a".repeat(50)), "a".repeat(50));
    }

    #[test]
    fn channel_order_is_preserved() {
        let posts = vec![
            post(3, Some(CUTOFF + 30), Some("c")),
            post(2, Some(CUTOFF - 10), Some("b")),
            post(1, Some(CUTOFF + 10), Some("a")),
        ];
        let ids: Vec<i32> = normalize_channel(&posts, &chan(), CUTOFF)
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }
}
