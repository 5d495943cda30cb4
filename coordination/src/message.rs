//! Message envelope for coordinator ↔ agent traffic.
//!
//! Every dispatch from the coordinator and every agent reply travels in an
//! [`AgentMessage`]. The envelope carries transport metadata only; the
//! payload is a typed [`Payload`] variant per agent role.
//!
//! ```text
//! coordinator ──request(corr=c1)──▶ keyword_extractor
//! coordinator ◀─response(corr=c1)── keyword_extractor
//! coordinator ──request(corr=c1)──▶ counter_argument
//!   ...                                  (same correlation id for the whole turn)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agents::argument::{ArgumentRequest, ArgumentResponse};
use crate::agents::counter::{CounterRequest, CounterResponse};
use crate::agents::evaluator::{EvaluationRequest, EvaluationResponse};
use crate::agents::keywords::{KeywordRequest, KeywordResponse};

/// Token shared by every message of one debate turn.
pub type CorrelationId = String;

/// Generate a fresh correlation id.
pub fn new_correlation_id() -> CorrelationId {
    uuid::Uuid::new_v4().to_string()
}

/// Closed set of message endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    Coordinator,
    KeywordExtractor,
    ArgumentGenerator,
    CounterArgument,
    EvaluationAgent,
}

impl AgentId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coordinator => "coordinator",
            Self::KeywordExtractor => "keyword_extractor",
            Self::ArgumentGenerator => "argument_generator",
            Self::CounterArgument => "counter_argument",
            Self::EvaluationAgent => "evaluation_agent",
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Request,
    Response,
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Response => write!(f, "response"),
        }
    }
}

/// Typed payload, one request and one response shape per agent role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    KeywordRequest(KeywordRequest),
    KeywordResponse(KeywordResponse),
    ArgumentRequest(ArgumentRequest),
    ArgumentResponse(ArgumentResponse),
    CounterRequest(CounterRequest),
    CounterResponse(CounterResponse),
    EvaluationRequest(EvaluationRequest),
    EvaluationResponse(EvaluationResponse),
}

impl Payload {
    /// Short label used in logs and events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::KeywordRequest(_) => "keyword_request",
            Self::KeywordResponse(_) => "keyword_response",
            Self::ArgumentRequest(_) => "argument_request",
            Self::ArgumentResponse(_) => "argument_response",
            Self::CounterRequest(_) => "counter_request",
            Self::CounterResponse(_) => "counter_response",
            Self::EvaluationRequest(_) => "evaluation_request",
            Self::EvaluationResponse(_) => "evaluation_response",
        }
    }
}

/// Immutable unit of inter-agent communication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    sender: AgentId,
    receiver: AgentId,
    message_type: MessageType,
    content: Payload,
    timestamp: DateTime<Utc>,
    correlation_id: CorrelationId,
}

impl AgentMessage {
    /// Build a request envelope.
    pub fn request(
        sender: AgentId,
        receiver: AgentId,
        content: Payload,
        correlation_id: &str,
    ) -> Self {
        Self {
            sender,
            receiver,
            message_type: MessageType::Request,
            content,
            timestamp: Utc::now(),
            correlation_id: correlation_id.to_string(),
        }
    }

    /// Build the response to this message. Sender and receiver swap; the
    /// correlation id is carried over unchanged.
    pub fn reply(&self, content: Payload) -> Self {
        Self {
            sender: self.receiver,
            receiver: self.sender,
            message_type: MessageType::Response,
            content,
            timestamp: Utc::now(),
            correlation_id: self.correlation_id.clone(),
        }
    }

    pub fn sender(&self) -> AgentId {
        self.sender
    }

    pub fn receiver(&self) -> AgentId {
        self.receiver
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn content(&self) -> &Payload {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Consume the envelope and keep the payload.
    pub fn into_content(self) -> Payload {
        self.content
    }
}
