//! Minimal LLM gateway contract.
//!
//! The pipeline treats the language model as an opaque function: a prompt
//! goes in, generated text (plus optional token usage) comes out. Everything
//! else — metering, retrieval, orchestration — lives in the application
//! crate. One concrete implementation is provided for OpenAI-compatible
//! chat-completions endpoints.

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use openai::OpenAiGateway;

/// Token counts reported by a gateway for one call.
///
/// Not every backend reports usage; callers must tolerate its absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Result of one gateway call: generated text plus optional usage metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl Completion {
    /// Completion carrying text only, no usage metadata.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

/// Gateway error types
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("response contained no generated text")]
    EmptyResponse,

    #[error("gateway not configured: {0}")]
    Configuration(String),
}

/// Opaque LLM callable: prompt in, text plus usage out.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Completion, GatewayError>;
}
