//! Debate records: one [`DebateTurn`] per human submission.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::{AgentStatus, EvaluationResponse};
use crate::message::AgentId;
use crate::scoring::CumulativeScores;

/// A completed round. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateTurn {
    /// Round number (1-indexed).
    pub round_number: u32,
    pub human_argument: String,
    pub ai_argument: String,
    /// Extracted from the human argument, best first.
    pub keywords: Vec<String>,
    pub evaluation: EvaluationResponse,
    pub timestamp: DateTime<Utc>,
}

impl DebateTurn {
    pub fn new(
        round_number: u32,
        human_argument: String,
        ai_argument: String,
        keywords: Vec<String>,
        evaluation: EvaluationResponse,
    ) -> Self {
        Self {
            round_number,
            human_argument,
            ai_argument,
            keywords,
            evaluation,
            timestamp: Utc::now(),
        }
    }
}

/// Caller-supplied context for a turn.
///
/// `topic` and `stance` are typed; anything else the transport sends rides
/// along in `extra` and is forwarded to the agents untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TurnContext {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub stance: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TurnContext {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }

    pub fn with_stance(mut self, stance: impl Into<String>) -> Self {
        self.stance = Some(stance.into());
        self
    }

    /// The whole context as a flat key/value map.
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        let mut map = self.extra.clone();
        map.insert("topic".to_string(), Value::String(self.topic.clone()));
        if let Some(stance) = &self.stance {
            map.insert("stance".to_string(), Value::String(stance.clone()));
        }
        map
    }
}

/// Running state of a debate reported alongside each turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateContext {
    /// Rounds recorded before this one.
    pub previous_rounds: usize,
    pub cumulative_scores: CumulativeScores,
}

/// Everything a transport needs to render one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    pub ai_argument: String,
    pub keywords: Vec<String>,
    pub evaluation: EvaluationResponse,
    pub round: u32,
    /// Rounds recorded for this debate, this one included.
    pub total_rounds: usize,
    pub debate_context: DebateContext,
    pub agent_status: BTreeMap<AgentId, AgentStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_turn_context_flattens_extra_fields() {
        let ctx: TurnContext = serde_json::from_value(json!({
            "topic": "Nuclear power",
            "stance": "against",
            "audience": "students"
        }))
        .unwrap();
        assert_eq!(ctx.topic, "Nuclear power");
        assert_eq!(ctx.stance.as_deref(), Some("against"));
        assert_eq!(ctx.extra["audience"], "students");

        let map = ctx.to_map();
        assert_eq!(map.len(), 3);
        assert_eq!(map["topic"], "Nuclear power");
    }

    #[test]
    fn test_turn_context_defaults() {
        let ctx: TurnContext = serde_json::from_value(json!({})).unwrap();
        assert!(ctx.topic.is_empty());
        assert!(ctx.stance.is_none());
        assert!(TurnContext::new("t").with_stance("for").to_map().contains_key("stance"));
    }
}
