use async_trait::async_trait;

use crate::Result;

use super::types::CompletionRequest;

/// Generative text service port (OpenAI chat completions today).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one completion.
    ///
    /// `Ok(None)` means the service answered but produced no content; transport
    /// and HTTP failures are `Err(Error::Generation)`.
    async fn complete(&self, req: CompletionRequest) -> Result<Option<String>>;
}
