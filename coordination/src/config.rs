//! Configuration for the debate core.
//!
//! Layering, later wins: built-in defaults → optional TOML file →
//! environment variables. Validation runs once after all layers apply.
//!
//! ```toml
//! log_level = "debug"
//!
//! [llm]
//! model = "claude-sonnet-4-5"
//! timeout_secs = 20
//!
//! [pipeline]
//! max_keywords = 8
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Text-generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions + embeddings.
    #[serde(rename = "openai")]
    OpenAi,
    /// Anthropic messages API.
    Anthropic,
    /// Offline echo provider; no network.
    Simulated,
}

impl ProviderKind {
    /// Infer a provider from a model name (`gpt-4` → openai, `claude-…` →
    /// anthropic, anything else → simulated).
    pub fn infer(model: &str) -> Self {
        let prefix = model.split('-').next().unwrap_or_default().to_lowercase();
        match prefix.as_str() {
            "gpt" | "openai" => Self::OpenAi,
            "claude" | "anthropic" => Self::Anthropic,
            _ => Self::Simulated,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Simulated => "",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Simulated)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Anthropic => write!(f, "anthropic"),
            Self::Simulated => write!(f, "simulated"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "simulated" | "offline" => Ok(Self::Simulated),
            other => Err(ConfigError::Invalid {
                key: "llm.provider".to_string(),
                reason: format!("unknown provider '{}'", other),
            }),
        }
    }
}

/// Text-generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Explicit provider; inferred from `model` when unset.
    pub provider: Option<ProviderKind>,
    pub model: String,
    pub api_key: Option<String>,
    /// Provider default when unset.
    pub base_url: Option<String>,
    pub embedding_model: String,
    /// Length of the zero vector returned when embedding fails.
    pub embedding_dimensions: usize,
    /// Upper bound on a single generation or embedding call.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: "gpt-4".to_string(),
            api_key: None,
            base_url: None,
            embedding_model: "text-embedding-ada-002".to_string(),
            embedding_dimensions: 1536,
            timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    /// Config for the offline provider, handy for tests and demos.
    pub fn simulated() -> Self {
        Self {
            provider: Some(ProviderKind::Simulated),
            model: "simulated".to_string(),
            ..Default::default()
        }
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider.unwrap_or_else(|| ProviderKind::infer(&self.model))
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.provider().default_base_url().to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Knobs for the per-turn agent pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Keywords requested from the extractor per turn.
    pub max_keywords: usize,
    /// Evidence snippets requested from the retriever.
    pub evidence_results: usize,
    /// Evidence snippets embedded in the generation prompt.
    pub evidence_in_prompt: usize,
    /// Characters kept from each evidence snippet.
    pub evidence_excerpt_chars: usize,
    /// Characters kept from each prior argument in the round digest.
    pub history_preview_chars: usize,
    /// Weaknesses kept from the analysis pass.
    pub max_weaknesses: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_keywords: 10,
            evidence_results: 5,
            evidence_in_prompt: 3,
            evidence_excerpt_chars: 200,
            history_preview_chars: 200,
            max_weaknesses: 3,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateConfig {
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            pipeline: PipelineConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl DebateConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::load(None)
    }

    /// Defaults → optional TOML file → process environment, then validate.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_toml_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. Missing keys keep their defaults.
    pub fn from_toml_file(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Overlay environment values obtained through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DEBATE_LLM_PROVIDER") {
            self.llm.provider = Some(v.parse()?);
        }
        if let Some(v) = lookup("DEBATE_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("DEBATE_LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Some(v) = lookup("DEBATE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_number("DEBATE_LLM_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("DEBATE_MAX_KEYWORDS") {
            self.pipeline.max_keywords = parse_number("DEBATE_MAX_KEYWORDS", &v)?;
        }
        if let Some(v) = lookup("DEBATE_LOG_LEVEL") {
            self.log_level = v;
        }
        if self.llm.api_key.is_none() {
            self.llm.api_key = match self.llm.provider() {
                ProviderKind::OpenAi => lookup("OPENAI_API_KEY"),
                ProviderKind::Anthropic => lookup("ANTHROPIC_API_KEY"),
                ProviderKind::Simulated => None,
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.llm.timeout_secs == 0 {
            return Err(invalid("llm.timeout_secs", "must be greater than zero"));
        }
        if self.pipeline.max_keywords == 0 {
            return Err(invalid("pipeline.max_keywords", "must be greater than zero"));
        }
        let provider = self.llm.provider();
        if provider.requires_api_key()
            && self.llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(invalid(
                "llm.api_key",
                &format!("provider {} requires an API key", provider),
            ));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> ConfigResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| invalid(key, &format!("'{}' is not a number", raw)))
}
