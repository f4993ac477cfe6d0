use chrono::NaiveDate;

use crate::{
    model::{
        client::TextGenerator,
        types::{ChatMessage, CompletionRequest, ResponseFormat, Sampling},
    },
    Result,
};

use super::{prompt::PromptTemplate, topics::TopicList};

pub const DIGEST_PLACEHOLDER: &str = "No summary available";
pub const JOKE_PLACEHOLDER: &str = "No joke available";

/// Generate the digest from the aggregate document.
///
/// An empty answer becomes [`DIGEST_PLACEHOLDER`]; transport errors propagate.
pub async fn compose_digest(
    generator: &dyn TextGenerator,
    model: &str,
    template: &PromptTemplate,
    date: NaiveDate,
    topics: &TopicList,
    aggregate: &str,
) -> Result<String> {
    let req = CompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(template.digest_instruction(date, topics)),
            ChatMessage::user(aggregate),
        ],
        max_tokens: Sampling::DIGEST.max_tokens,
        temperature: Sampling::DIGEST.temperature,
        response_format: ResponseFormat::Text,
    };
    let digest = or_placeholder(generator.complete(req).await?, DIGEST_PLACEHOLDER);
    tracing::info!("Summary length: {} characters", digest.chars().count());
    Ok(digest)
}

/// Generate the closing joke from the finished digest text.
pub async fn compose_joke(
    generator: &dyn TextGenerator,
    model: &str,
    template: &PromptTemplate,
    digest: &str,
) -> Result<String> {
    let req = CompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(template.joke_instruction()),
            ChatMessage::user(digest),
        ],
        max_tokens: Sampling::JOKE.max_tokens,
        temperature: Sampling::JOKE.temperature,
        response_format: ResponseFormat::Text,
    };
    let joke = or_placeholder(generator.complete(req).await?, JOKE_PLACEHOLDER);
    tracing::info!("Joke length: {} characters", joke.chars().count());
    Ok(joke)
}

fn or_placeholder(content: Option<String>, placeholder: &str) -> String {
    content
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}
