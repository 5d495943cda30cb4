//! Text-generation capability consumed by the agents.
//!
//! Agents only see [`TextGenerator`]: `generate` always yields text and
//! `embed` always yields a vector. Provider errors and timeouts are absorbed
//! by the implementation and replaced with [`FALLBACK_RESPONSE`] or a zero
//! vector, so a flaky backend degrades a turn instead of aborting it.

pub mod service;

pub use service::{LlmHealth, LlmService};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Substituted for any failed or timed-out generation.
pub const FALLBACK_RESPONSE: &str =
    "I apologize, but I'm having trouble generating a response right now.";

/// Per-call generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            temperature: 0.7,
            system_prompt: None,
        }
    }
}

impl GenerationOptions {
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// Opaque text-generation backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`. Never fails; degraded output on error.
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> String;

    /// Embed `text`. Never fails; zero vector on error.
    async fn embed(&self, text: &str) -> Vec<f32>;
}

/// Provider-level failures. These stay inside [`LlmService`].
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

pub type LlmResult<T> = Result<T, LlmError>;
