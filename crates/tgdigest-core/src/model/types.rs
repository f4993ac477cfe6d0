use serde::{Deserialize, Serialize};

/// Chat role of one prompt message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Response mode requested from the generative service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// Structured-output mode: the service must return one JSON object.
    JsonObject,
}

/// Normalized request for a single completion.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

/// Sampling parameters for one generative stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Sampling {
    pub const TOPICS: Sampling = Sampling {
        max_tokens: 300,
        temperature: 0.3,
    };
    pub const DIGEST: Sampling = Sampling {
        max_tokens: 1200,
        temperature: 0.6,
    };
    pub const JOKE: Sampling = Sampling {
        max_tokens: 300,
        temperature: 0.8,
    };
}
