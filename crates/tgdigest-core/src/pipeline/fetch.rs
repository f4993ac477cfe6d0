use crate::{
    domain::{Channel, RawPost},
    messaging::port::ChannelSource,
};

/// Per-channel fetch result; a failure never aborts the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelFetch {
    Fetched(Vec<RawPost>),
    Failed(String),
}

pub async fn fetch_channel(
    source: &dyn ChannelSource,
    channel: &Channel,
    limit: usize,
) -> ChannelFetch {
    match source.fetch_history(channel, limit, None).await {
        Ok(posts) => {
            tracing::info!(channel = %channel, "Total messages received: {}", posts.len());
            ChannelFetch::Fetched(posts)
        }
        Err(e) => {
            tracing::warn!(channel = %channel, error = %e, "fetch failed; channel skipped");
            ChannelFetch::Failed(e.to_string())
        }
    }
}

/// A full page whose oldest post is still inside the window may have cut
/// off older in-window posts.
pub fn possibly_truncated(posts: &[RawPost], limit: usize, cutoff: i64) -> bool {
    if posts.len() < limit {
        return false;
    }
    posts
        .iter()
        .filter_map(|p| p.timestamp)
        .min()
        .is_some_and(|oldest| oldest >= cutoff)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ts: i64) -> RawPost {
        RawPost {
            timestamp: Some(ts),
            ..RawPost::default()
        }
    }

    #[test]
    fn truncation_needs_full_page_inside_window() {
        assert!(possibly_truncated(&[at(20), at(15)], 2, 10));
        assert!(!possibly_truncated(&[at(20), at(5)], 2, 10));
        assert!(!possibly_truncated(&[at(20)], 2, 10));
    }
}
