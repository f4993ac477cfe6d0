use async_trait::async_trait;

use crate::{
    domain::{Channel, Destination, RawPost},
    Result,
};

/// Lifecycle of the single platform connection used for one run.
#[async_trait]
pub trait PlatformSession: Send + Sync {
    async fn connect(&self) -> Result<()>;

    /// Must be safe after a failed connect, without a connect, and when called twice.
    async fn disconnect(&self);
}

/// History retrieval for one source channel.
#[async_trait]
pub trait ChannelSource: Send + Sync {
    /// Up to `limit` most recent posts, newest first.
    ///
    /// `offset_date` asks the platform to start from posts older than that
    /// unix time; the pipeline filters client-side and passes `None`.
    async fn fetch_history(
        &self,
        channel: &Channel,
        limit: usize,
        offset_date: Option<i64>,
    ) -> Result<Vec<RawPost>>;
}

/// Outbound delivery of a finished markdown message.
#[async_trait]
pub trait DigestSink: Send + Sync {
    async fn send_markdown(&self, destination: &Destination, text: &str) -> Result<()>;
}
