//! [`LlmService`] is the production [`TextGenerator`].
//!
//! Talks to an OpenAI-compatible endpoint or the Anthropic messages API over
//! `reqwest`, or runs fully offline in simulated mode. Every call is bounded
//! by the configured timeout.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{GenerationOptions, LlmError, LlmResult, TextGenerator, FALLBACK_RESPONSE};
use crate::config::{LlmConfig, ProviderKind};
use crate::text::preview;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_DEFAULT_SYSTEM: &str = "You are a skilled debater.";
const HASHED_EMBEDDING_DIMS: usize = 256;

/// Call counters, for observability only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmHealth {
    pub provider: ProviderKind,
    pub model: String,
    pub calls: u64,
    pub failures: u64,
    pub timeouts: u64,
}

/// Text generation over a configured provider.
pub struct LlmService {
    config: LlmConfig,
    provider: ProviderKind,
    http: reqwest::Client,
    calls: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
}

impl LlmService {
    /// The client carries no timeout of its own; `bounded` owns the
    /// deadline so expiries are counted as timeouts.
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::Http(e.to_string()))?;
        let provider = config.provider();
        Ok(Self {
            config,
            provider,
            http,
            calls: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
        })
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn health(&self) -> LlmHealth {
        LlmHealth {
            provider: self.provider,
            model: self.config.model.clone(),
            calls: self.calls.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }

    fn api_key(&self) -> &str {
        self.config.api_key.as_deref().unwrap_or_default()
    }

    async fn try_generate(&self, prompt: &str, options: &GenerationOptions) -> LlmResult<String> {
        match self.provider {
            ProviderKind::OpenAi => self.generate_openai(prompt, options).await,
            ProviderKind::Anthropic => self.generate_anthropic(prompt, options).await,
            ProviderKind::Simulated => Ok(format!(
                "[Simulated response to: {}...]",
                preview(prompt, 100)
            )),
        }
    }

    async fn generate_openai(&self, prompt: &str, options: &GenerationOptions) -> LlmResult<String> {
        #[derive(Serialize)]
        struct ChatMessage<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage<'a>>,
            max_tokens: u32,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            content: Option<String>,
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system_prompt.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url()))
            .bearer_auth(self.api_key())
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let chat: ChatResponse = read_json(response).await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Malformed("no choices in response".to_string()))
    }

    async fn generate_anthropic(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> LlmResult<String> {
        #[derive(Serialize)]
        struct UserMessage<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct MessagesRequest<'a> {
            model: &'a str,
            max_tokens: u32,
            temperature: f32,
            system: &'a str,
            messages: Vec<UserMessage<'a>>,
        }

        #[derive(Deserialize)]
        struct MessagesResponse {
            content: Vec<ContentBlock>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            text: Option<String>,
        }

        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            system: options
                .system_prompt
                .as_deref()
                .unwrap_or(ANTHROPIC_DEFAULT_SYSTEM),
            messages: vec![UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(format!("{}/messages", self.config.base_url()))
            .header("x-api-key", self.api_key())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let body: MessagesResponse = read_json(response).await?;
        body.content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| LlmError::Malformed("no text block in response".to_string()))
    }

    async fn try_embed(&self, text: &str) -> LlmResult<Vec<f32>> {
        #[derive(Serialize)]
        struct EmbeddingRequest<'a> {
            model: &'a str,
            input: &'a str,
        }

        #[derive(Deserialize)]
        struct EmbeddingResponse {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
        }

        if self.provider != ProviderKind::OpenAi {
            return Ok(hashed_embedding(text));
        }

        let response = self
            .http
            .post(format!("{}/embeddings", self.config.base_url()))
            .bearer_auth(self.api_key())
            .json(&EmbeddingRequest {
                model: &self.config.embedding_model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let body: EmbeddingResponse = read_json(response).await?;
        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::Malformed("no embedding in response".to_string()))
    }

    /// Run `fut` under the configured timeout, counting the outcome.
    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> LlmResult<T>
    where
        F: std::future::Future<Output = LlmResult<T>>,
    {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let limit = self.config.timeout();
        let result = match tokio::time::timeout(limit, fut).await {
            Ok(inner) => inner,
            Err(_) => Err(LlmError::Timeout(limit)),
        };
        match &result {
            Err(LlmError::Timeout(_)) => {
                self.timeouts.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
            }
            Ok(_) => {}
        }
        if let Err(e) = &result {
            warn!(op, provider = %self.provider, error = %e, "LLM call failed, degrading");
        }
        result
    }
}

#[async_trait]
impl TextGenerator for LlmService {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> String {
        let start = Instant::now();
        match self.bounded("generate", self.try_generate(prompt, options)).await {
            Ok(text) => {
                debug!(
                    provider = %self.provider,
                    latency_ms = start.elapsed().as_millis() as u64,
                    chars = text.len(),
                    "Generation complete"
                );
                text
            }
            Err(_) => FALLBACK_RESPONSE.to_string(),
        }
    }

    async fn embed(&self, text: &str) -> Vec<f32> {
        match self.bounded("embed", self.try_embed(text)).await {
            Ok(vector) => vector,
            Err(_) => vec![0.0; self.config.embedding_dimensions],
        }
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> LlmResult<T> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Status { status, body });
    }
    response
        .json()
        .await
        .map_err(|e| LlmError::Malformed(e.to_string()))
}

/// Deterministic offline embedding: lowercased alphanumeric tokens hashed
/// (FNV-1a) into fixed buckets, then L2-normalised.
pub fn hashed_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; HASHED_EMBEDDING_DIMS];
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in token.to_lowercase().bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        vector[(hash % HASHED_EMBEDDING_DIMS as u64) as usize] += 1.0;
    }
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
    vector
}
