//! Text generation: the single external capability every step depends on
//!
//! Each pipeline step is one prompt sent through a [`TextGenerator`] followed
//! by parsing of the reply. Two implementations:
//! - `OpenAiGenerator`: OpenAI-compatible chat completions over HTTP (production)
//! - `ScriptedGenerator`: replays queued replies in order (testing)
//!
//! The core never retries; a failed call surfaces as a [`GenerationError`].

mod openai;
mod scripted;

pub use openai::OpenAiGenerator;
pub use scripted::{RecordedCall, ScriptedGenerator};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors from text generation calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    #[error("generator not available: {0}")]
    Unavailable(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("rate limited by provider")]
    RateLimited,
    #[error("authentication failed")]
    Auth,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Generator trait for producing text from a prompt.
///
/// Abstracts over transport (HTTP, scripted) so discussion steps don't depend
/// on how the model is reached.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short name recorded as `generated_by` on edges.
    fn name(&self) -> &str;

    /// Generate a reply to `prompt` under `system_instruction`.
    async fn generate(
        &self,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<String, GenerationError>;
}

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Connection and sampling settings for the HTTP generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API; `/chat/completions` is appended
    pub base_url: String,
    /// Bearer key; usually supplied through the environment
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 8192,
            timeout_secs: 120,
        }
    }
}
