//! Topic extraction: ask the service for the dominant themes of the aggregate.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    errors::Error,
    model::{
        client::TextGenerator,
        types::{ChatMessage, CompletionRequest, ResponseFormat, Sampling},
    },
    Result,
};

use super::prompt::PromptTemplate;

pub const MAX_TOPICS: usize = 5;

/// Ranked themes, most frequent first. Empty is a valid fallback.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TopicList(Vec<String>);

impl TopicList {
    /// Trims entries, drops blanks, keeps at most [`MAX_TOPICS`].
    pub fn new(topics: Vec<String>) -> Self {
        Self(
            topics
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .take(MAX_TOPICS)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn join(&self, sep: &str) -> String {
        self.0.join(sep)
    }
}

#[derive(Deserialize)]
struct TopicsEnvelope {
    topics: Vec<Value>,
}

/// Parse `{"topics": [...]}` or a bare `[...]`.
///
/// Text-mode answers may wrap the JSON in prose; the first JSON object or
/// array found in the text is used.
pub fn parse_topics(raw: &str) -> Result<TopicList> {
    let value: Value = match serde_json::from_str(raw.trim()) {
        Ok(v) => v,
        Err(e) => match embedded_json(raw) {
            Some(inner) => serde_json::from_str(inner)?,
            None => return Err(Error::Json(e)),
        },
    };

    let items = match value {
        Value::Array(items) => items,
        Value::Object(_) => serde_json::from_value::<TopicsEnvelope>(value)?.topics,
        other => {
            return Err(Error::External(format!(
                "unexpected topics payload: {other}"
            )))
        }
    };

    Ok(TopicList::new(
        items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
    ))
}

fn embedded_json(raw: &str) -> Option<&str> {
    let start = raw.find(['{', '['])?;
    let close = if raw[start..].starts_with('{') { '}' } else { ']' };
    let end = raw.rfind(close)?;
    (end > start).then(|| &raw[start..=end])
}

/// Run the topic-extraction stage.
///
/// Malformed answers degrade to an empty list; transport failures propagate.
pub async fn extract_topics(
    generator: &dyn TextGenerator,
    model: &str,
    template: &PromptTemplate,
    aggregate: &str,
) -> Result<TopicList> {
    let response_format = if template.structured_topics {
        ResponseFormat::JsonObject
    } else {
        ResponseFormat::Text
    };
    let req = CompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(template.topics_instruction()),
            ChatMessage::user(aggregate),
        ],
        max_tokens: Sampling::TOPICS.max_tokens,
        temperature: Sampling::TOPICS.temperature,
        response_format,
    };

    let Some(content) = generator.complete(req).await? else {
        tracing::warn!("topic extraction returned no content");
        return Ok(TopicList::default());
    };

    match parse_topics(&content) {
        Ok(topics) => {
            tracing::info!("Top mentioned topics: {}", topics.join(", "));
            Ok(topics)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse top topics");
            Ok(TopicList::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_object_and_bare_array() {
        let t = parse_topics(r#"{"topics": ["LLMs", " GPUs ", "", 3, "Rust"]}"#).unwrap();
        assert_eq!(t.as_slice(), ["LLMs", "GPUs", "Rust"]);

        let t = parse_topics(r#"["a", "b"]"#).unwrap();
        assert_eq!(t.as_slice(), ["a", "b"]);
    }

    #[test]
    fn caps_at_five_topics() {
        let t = parse_topics(r#"{"topics": ["1","2","3","4","5","6","7"]}"#).unwrap();
        assert_eq!(t.len(), MAX_TOPICS);
    }

    #[test]
    fn extracts_json_wrapped_in_prose() {
        let t = parse_topics("Sure! Here you go:\n{\"topics\": [\"agents\"]}\nEnjoy.").unwrap();
        assert_eq!(t.as_slice(), ["agents"]);
    }

    #[test]
    fn malformed_or_missing_field_is_an_error() {
        assert!(parse_topics("not json at all").is_err());
        assert!(parse_topics(r#"{"themes": ["x"]}"#).is_err());
        assert!(parse_topics(r#""just a string""#).is_err());
        assert!(parse_topics(r#"{"topics": "x"}"#).is_err());
    }
}
