//! Events emitted while a debate turn runs.
//!
//! Every event carries the turn's correlation id, so the full causal chain
//! of a turn can be rebuilt from the stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{AgentId, CorrelationId, MessageType};
use crate::scoring::RoundWinner;

/// All turn-level events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DebateEvent {
    /// A turn acquired its debate and was assigned a round.
    TurnStarted {
        debate_id: String,
        correlation_id: CorrelationId,
        round: u32,
        timestamp: DateTime<Utc>,
    },

    /// An envelope crossed between the coordinator and an agent.
    MessageDispatched {
        debate_id: String,
        correlation_id: CorrelationId,
        sender: AgentId,
        receiver: AgentId,
        message_type: MessageType,
        payload_kind: String,
        timestamp: DateTime<Utc>,
    },

    /// The turn was recorded in history.
    TurnCompleted {
        debate_id: String,
        correlation_id: CorrelationId,
        round: u32,
        winner: RoundWinner,
        human_total: f64,
        ai_total: f64,
        timestamp: DateTime<Utc>,
    },

    /// The turn failed and was not recorded.
    TurnFailed {
        debate_id: String,
        correlation_id: CorrelationId,
        round: u32,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl DebateEvent {
    /// Snake-case name, matching the serde tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TurnStarted { .. } => "turn_started",
            Self::MessageDispatched { .. } => "message_dispatched",
            Self::TurnCompleted { .. } => "turn_completed",
            Self::TurnFailed { .. } => "turn_failed",
        }
    }

    pub fn debate_id(&self) -> &str {
        match self {
            Self::TurnStarted { debate_id, .. }
            | Self::MessageDispatched { debate_id, .. }
            | Self::TurnCompleted { debate_id, .. }
            | Self::TurnFailed { debate_id, .. } => debate_id,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::TurnStarted { correlation_id, .. }
            | Self::MessageDispatched { correlation_id, .. }
            | Self::TurnCompleted { correlation_id, .. }
            | Self::TurnFailed { correlation_id, .. } => correlation_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::TurnStarted { timestamp, .. }
            | Self::MessageDispatched { timestamp, .. }
            | Self::TurnCompleted { timestamp, .. }
            | Self::TurnFailed { timestamp, .. } => *timestamp,
        }
    }
}
