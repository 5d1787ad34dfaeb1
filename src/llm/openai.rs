//! OpenAI-compatible chat completions generator

use super::{GenerationError, LlmConfig, TextGenerator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Generator backed by any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiGenerator {
    config: LlmConfig,
    client: reqwest::Client,
    endpoint: String,
}

impl OpenAiGenerator {
    /// Create a generator; fails when no API key is configured.
    pub fn new(config: LlmConfig) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::Auth);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Unavailable(e.to_string()))?;

        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));

        Ok(Self {
            config,
            client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(
        &self,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<String, GenerationError> {
        let mut messages = Vec::with_capacity(2);
        if !system_instruction.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system_instruction,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(endpoint = %self.endpoint, model = %self.config.model, "sending chat completion");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    GenerationError::Unavailable(e.to_string())
                } else {
                    GenerationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &body));
        }

        parse_reply(&body)
    }
}

/// Map a non-success HTTP status to an error.
fn classify_failure(status: u16, body: &str) -> GenerationError {
    match status {
        401 | 403 => GenerationError::Auth,
        429 => GenerationError::RateLimited,
        _ => {
            let message = serde_json::from_str::<ApiErrorBody>(body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| body.to_string());
            GenerationError::Api { status, message }
        }
    }
}

/// Pull the first choice's content out of a completion body.
fn parse_reply(body: &str) -> Result<String, GenerationError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| GenerationError::InvalidResponse("no content in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: &str) -> LlmConfig {
        LlmConfig {
            api_key: key.to_string(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn missing_key_is_an_auth_error() {
        let result = OpenAiGenerator::new(config_with_key("  "));
        assert!(matches!(result, Err(GenerationError::Auth)));
    }

    #[test]
    fn endpoint_joins_base_url() {
        let config = LlmConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..config_with_key("sk-test")
        };
        let generator = OpenAiGenerator::new(config).unwrap();
        assert_eq!(generator.endpoint(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(generator.name(), "gpt-4o");
    }

    #[test]
    fn reply_content_is_extracted() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "hello");
    }

    #[test]
    fn empty_choices_are_invalid() {
        let err = parse_reply(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidResponse(_)));
        let err = parse_reply("not json").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidResponse(_)));
    }

    #[test]
    fn statuses_are_classified() {
        assert!(matches!(classify_failure(401, ""), GenerationError::Auth));
        assert!(matches!(classify_failure(429, ""), GenerationError::RateLimited));
        match classify_failure(500, r#"{"error":{"message":"boom"}}"#) {
            GenerationError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
