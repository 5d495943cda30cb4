//! Debate Coordination Library
//!
//! The agent coordination core of a human-vs-AI debate service:
//! - A typed message envelope for coordinator ↔ agent traffic
//! - Four specialised agents behind one request/response contract
//! - A coordinator that runs the per-turn pipeline and keeps per-debate history
//! - Round scoring with a deadband winner rule and cumulative totals
//!
//! # Turn Pipeline
//!
//! ```text
//! ┌───────────┐   ┌───────────────────┐   ┌──────────────────┐   ┌──────────────────┐
//! │ transport │──▶│ keyword_extractor │──▶│ counter_argument │──▶│ evaluation_agent │
//! └───────────┘   └───────────────────┘   └──────────────────┘   └──────────────────┘
//!       ▲                                                                   │
//!       └──────────────────── TurnResult (round, scores, status) ◀──────────┘
//! ```
//!
//! # Collaborators
//!
//! - [`llm::TextGenerator`]: text generation and embeddings. [`llm::LlmService`]
//!   talks to OpenAI, Anthropic or a simulated backend.
//! - [`retrieval::Retriever`]: evidence lookup for the argument generator.
//! - [`events::EventBus`]: turn audit trail.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use debate_coordination::{DebateCoordinator, LlmConfig, LlmService, NoRetriever, PipelineConfig, TurnContext};
//!
//! let llm = Arc::new(LlmService::new(LlmConfig::simulated())?);
//! let coordinator = DebateCoordinator::new(llm, Arc::new(NoRetriever), PipelineConfig::default());
//!
//! let result = coordinator
//!     .process_debate_turn("debate-1", "Renewable energy reduces emissions", TurnContext::new("Energy policy"))
//!     .await?;
//! println!("round {}: {}", result.round, result.ai_argument);
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod agents;
pub mod config;
pub mod debate;
pub mod events;
pub mod llm;
pub mod message;
pub mod prompts;
pub mod retrieval;
pub mod scoring;
pub mod text;

pub use agents::{
    Agent, AgentError, AgentRegistry, AgentResult, AgentRole, AgentState, AgentStatus,
    ArgumentResponse, CounterResponse, EvaluationResponse, KeywordResponse,
};
pub use config::{ConfigError, ConfigResult, DebateConfig, LlmConfig, PipelineConfig, ProviderKind};
pub use debate::{
    CoordinatorError, CoordinatorResult, DebateCoordinator, DebateTurn, SharedDebateCoordinator,
    Transcript, TranscriptError, TurnContext, TurnResult,
};
pub use events::{DebateEvent, EventBus, EventFilter, SharedEventBus};
pub use llm::{GenerationOptions, LlmError, LlmHealth, LlmService, TextGenerator, FALLBACK_RESPONSE};
pub use message::{AgentId, AgentMessage, CorrelationId, MessageType, Payload};
pub use retrieval::{Document, Evidence, NoRetriever, Retriever, VectorRetriever};
pub use scoring::{CumulativeScores, RoundWinner, ScoreCard};
