/// Core error type for the digest pipeline.
///
/// Adapter crates map their transport errors into this type so the pipeline
/// can tell fatal failures (generation, send) from locally recovered ones.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("fetch error for {channel}: {reason}")]
    Fetch { channel: String, reason: String },

    #[error("generation error: {0}")]
    Generation(String),

    #[error("send error: {0}")]
    Send(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
