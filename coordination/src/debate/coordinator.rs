//! Debate coordinator - drives the per-turn agent pipeline
//!
//! Owns the agent registry and every debate's history. A turn runs three
//! stages in strict sequence, each feeding the next:
//!
//! ```text
//! human argument ─▶ keyword_extractor ─▶ counter_argument ─▶ evaluation_agent
//!                    (keywords)           (AI rebuttal)        (scores, winner)
//! ```
//!
//! Turns for one debate are serialized by a per-debate lock that also guards
//! the next round number, so concurrent submissions get consecutive rounds
//! with no gaps. Different debates run fully in parallel.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::agents::{
    AgentError, AgentRegistry, AgentStatus, ArgumentRequest, ArgumentResponse, CounterRequest,
    CounterResponse, EvaluationRequest, EvaluationResponse, KeywordRequest, KeywordResponse,
};
use crate::config::PipelineConfig;
use crate::events::{DebateEvent, EventBus, SharedEventBus};
use crate::llm::TextGenerator;
use crate::message::{new_correlation_id, AgentId, AgentMessage, Payload};
use crate::retrieval::Retriever;
use crate::scoring::CumulativeScores;

use super::state::{DebateContext, DebateTurn, TurnContext, TurnResult};

/// Error type for coordinator operations
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("debate id must not be empty")]
    InvalidDebateId,

    #[error("human argument must not be empty")]
    EmptyArgument,

    #[error("agent {0} is not registered")]
    AgentNotRegistered(AgentId),

    #[error("agent {0} returned no response")]
    NoResponse(AgentId),

    #[error("agent {agent} answered with an unexpected {kind} payload")]
    UnexpectedResponse { agent: AgentId, kind: &'static str },

    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Result type for coordinator operations
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Shared reference to DebateCoordinator
pub type SharedDebateCoordinator = Arc<DebateCoordinator>;

/// One debate's history plus the lock that serializes its turns.
struct DebateLog {
    /// Round the next successful turn receives. Held for a whole turn.
    next_round: Mutex<u32>,
    turns: RwLock<Vec<DebateTurn>>,
}

impl DebateLog {
    fn new() -> Self {
        Self {
            next_round: Mutex::new(1),
            turns: RwLock::new(Vec::new()),
        }
    }
}

/// Central orchestrator for debate turns
pub struct DebateCoordinator {
    agents: AgentRegistry,
    config: PipelineConfig,
    event_bus: SharedEventBus,
    debates: RwLock<HashMap<String, Arc<DebateLog>>>,
}

impl DebateCoordinator {
    /// Build the coordinator and every agent over the given collaborators.
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        retriever: Arc<dyn Retriever>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            agents: AgentRegistry::new(llm, retriever, &config),
            config,
            event_bus: EventBus::new().shared(),
            debates: RwLock::new(HashMap::new()),
        }
    }

    /// Publish turn events on an existing bus.
    pub fn with_event_bus(mut self, event_bus: SharedEventBus) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Create a shared reference to this coordinator
    pub fn shared(self) -> SharedDebateCoordinator {
        Arc::new(self)
    }

    pub fn event_bus(&self) -> &SharedEventBus {
        &self.event_bus
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    // =========================================================================
    // Turn processing
    // =========================================================================

    /// Run one full turn for `debate_id` and record it.
    ///
    /// A failed turn is reported to the caller and leaves history and the
    /// round counter untouched.
    pub async fn process_debate_turn(
        &self,
        debate_id: &str,
        user_argument: &str,
        context: TurnContext,
    ) -> CoordinatorResult<TurnResult> {
        if debate_id.trim().is_empty() {
            return Err(CoordinatorError::InvalidDebateId);
        }

        let log = self.debate_log(debate_id).await;
        let mut next_round = log.next_round.lock().await;
        let round = *next_round;
        let correlation_id = new_correlation_id();
        let started = Instant::now();

        info!(debate_id, round, correlation_id = %correlation_id, "Processing debate turn");
        self.event_bus.publish(DebateEvent::TurnStarted {
            debate_id: debate_id.to_string(),
            correlation_id: correlation_id.clone(),
            round,
            timestamp: Utc::now(),
        });

        let outcome = self
            .run_pipeline(debate_id, &correlation_id, round, user_argument, &context, &log)
            .await;

        let turn = match outcome {
            Ok(turn) => turn,
            Err(e) => {
                error!(debate_id, round, correlation_id = %correlation_id, error = %e, "Debate turn failed");
                self.event_bus.publish(DebateEvent::TurnFailed {
                    debate_id: debate_id.to_string(),
                    correlation_id,
                    round,
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                return Err(e);
            }
        };

        let (total_rounds, cumulative_scores) = {
            let mut turns = log.turns.write().await;
            turns.push(turn.clone());
            (turns.len(), cumulative_from(&turns))
        };
        *next_round += 1;
        drop(next_round);

        let evaluation = turn.evaluation;
        info!(
            debate_id,
            round,
            correlation_id = %correlation_id,
            winner = %evaluation.round_winner,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Debate turn recorded"
        );
        self.event_bus.publish(DebateEvent::TurnCompleted {
            debate_id: debate_id.to_string(),
            correlation_id,
            round,
            winner: evaluation.round_winner,
            human_total: evaluation.human_scores.total(),
            ai_total: evaluation.ai_scores.total(),
            timestamp: Utc::now(),
        });

        Ok(TurnResult {
            ai_argument: turn.ai_argument,
            keywords: turn.keywords,
            evaluation,
            round,
            total_rounds,
            debate_context: DebateContext {
                previous_rounds: total_rounds - 1,
                cumulative_scores,
            },
            agent_status: self.get_all_agent_status(),
        })
    }

    async fn run_pipeline(
        &self,
        debate_id: &str,
        correlation_id: &str,
        round: u32,
        user_argument: &str,
        context: &TurnContext,
        log: &DebateLog,
    ) -> CoordinatorResult<DebateTurn> {
        if user_argument.trim().is_empty() {
            return Err(CoordinatorError::EmptyArgument);
        }
        let scope = Some(debate_id);

        let keywords = self
            .dispatch(
                scope,
                correlation_id,
                AgentId::KeywordExtractor,
                Payload::KeywordRequest(KeywordRequest {
                    text: user_argument.to_string(),
                    max_keywords: self.config.max_keywords,
                }),
            )
            .await
            .and_then(expect_keywords)?;

        let debate_history = log.turns.read().await.clone();
        let counter = self
            .dispatch(
                scope,
                correlation_id,
                AgentId::CounterArgument,
                Payload::CounterRequest(CounterRequest {
                    opponent_argument: user_argument.to_string(),
                    topic: context.topic.clone(),
                    keywords: keywords.keywords.clone(),
                    context: context.to_map(),
                    debate_history,
                    round_number: round,
                }),
            )
            .await
            .and_then(expect_counter)?;

        let evaluation = self
            .dispatch(
                scope,
                correlation_id,
                AgentId::EvaluationAgent,
                Payload::EvaluationRequest(EvaluationRequest {
                    human_argument: user_argument.to_string(),
                    ai_argument: counter.counter_argument.clone(),
                    topic: context.topic.clone(),
                    round,
                }),
            )
            .await
            .and_then(expect_evaluation)?;

        Ok(DebateTurn::new(
            round,
            user_argument.to_string(),
            counter.counter_argument,
            keywords.keywords,
            evaluation,
        ))
    }

    /// Generate a standalone argument, outside any turn.
    pub async fn generate_argument(
        &self,
        topic: &str,
        stance: Option<&str>,
        keywords: Vec<String>,
    ) -> CoordinatorResult<ArgumentResponse> {
        let correlation_id = new_correlation_id();
        let payload = self
            .dispatch(
                None,
                &correlation_id,
                AgentId::ArgumentGenerator,
                Payload::ArgumentRequest(ArgumentRequest {
                    topic: topic.to_string(),
                    keywords,
                    stance: stance.map(str::to_string),
                    context: BTreeMap::new(),
                }),
            )
            .await?;
        match payload {
            Payload::ArgumentResponse(response) => Ok(response),
            other => Err(unexpected(AgentId::ArgumentGenerator, &other)),
        }
    }

    /// Send one request envelope and wait for its reply. Dispatches that
    /// belong to a debate are published on the event bus.
    async fn dispatch(
        &self,
        debate_id: Option<&str>,
        correlation_id: &str,
        receiver: AgentId,
        payload: Payload,
    ) -> CoordinatorResult<Payload> {
        let agent = self
            .agents
            .get(receiver)
            .ok_or(CoordinatorError::AgentNotRegistered(receiver))?;

        let request = AgentMessage::request(AgentId::Coordinator, receiver, payload, correlation_id);
        self.publish_dispatch(debate_id, &request);

        let response = agent
            .receive_message(request)
            .await?
            .ok_or(CoordinatorError::NoResponse(receiver))?;
        self.publish_dispatch(debate_id, &response);

        Ok(response.into_content())
    }

    fn publish_dispatch(&self, debate_id: Option<&str>, message: &AgentMessage) {
        if let Some(debate_id) = debate_id {
            self.event_bus.publish(DebateEvent::MessageDispatched {
                debate_id: debate_id.to_string(),
                correlation_id: message.correlation_id().to_string(),
                sender: message.sender(),
                receiver: message.receiver(),
                message_type: message.message_type(),
                payload_kind: message.content().kind().to_string(),
                timestamp: message.timestamp(),
            });
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Status of every agent, keyed by id.
    pub fn get_all_agent_status(&self) -> BTreeMap<AgentId, AgentStatus> {
        self.agents.statuses()
    }

    /// Recorded turns, oldest first. Empty for unknown debates.
    pub async fn get_debate_history(&self, debate_id: &str) -> Vec<DebateTurn> {
        match self.existing_log(debate_id).await {
            Some(log) => log.turns.read().await.clone(),
            None => Vec::new(),
        }
    }

    pub async fn round_count(&self, debate_id: &str) -> usize {
        match self.existing_log(debate_id).await {
            Some(log) => log.turns.read().await.len(),
            None => 0,
        }
    }

    /// Debates with at least one recorded turn, sorted.
    pub async fn debate_ids(&self) -> Vec<String> {
        let logs: Vec<(String, Arc<DebateLog>)> = self
            .debates
            .read()
            .await
            .iter()
            .map(|(id, log)| (id.clone(), Arc::clone(log)))
            .collect();

        let mut ids = Vec::with_capacity(logs.len());
        for (id, log) in logs {
            if !log.turns.read().await.is_empty() {
                ids.push(id);
            }
        }
        ids.sort();
        ids
    }

    /// Sums and averages of both sides' totals. Zero rounds yield zero
    /// averages.
    pub async fn calculate_cumulative_scores(&self, debate_id: &str) -> CumulativeScores {
        match self.existing_log(debate_id).await {
            Some(log) => cumulative_from(&log.turns.read().await),
            None => CumulativeScores::default(),
        }
    }

    async fn existing_log(&self, debate_id: &str) -> Option<Arc<DebateLog>> {
        self.debates.read().await.get(debate_id).cloned()
    }

    async fn debate_log(&self, debate_id: &str) -> Arc<DebateLog> {
        if let Some(log) = self.existing_log(debate_id).await {
            return log;
        }
        let mut debates = self.debates.write().await;
        Arc::clone(
            debates
                .entry(debate_id.to_string())
                .or_insert_with(|| Arc::new(DebateLog::new())),
        )
    }
}

fn cumulative_from(turns: &[DebateTurn]) -> CumulativeScores {
    CumulativeScores::from_rounds(turns.iter().map(|t| {
        (
            &t.evaluation.human_scores,
            &t.evaluation.ai_scores,
            t.evaluation.round_winner,
        )
    }))
}

fn unexpected(agent: AgentId, payload: &Payload) -> CoordinatorError {
    warn!(agent = %agent, kind = payload.kind(), "Unexpected response payload");
    CoordinatorError::UnexpectedResponse {
        agent,
        kind: payload.kind(),
    }
}

fn expect_keywords(payload: Payload) -> CoordinatorResult<KeywordResponse> {
    match payload {
        Payload::KeywordResponse(r) => Ok(r),
        other => Err(unexpected(AgentId::KeywordExtractor, &other)),
    }
}

fn expect_counter(payload: Payload) -> CoordinatorResult<CounterResponse> {
    match payload {
        Payload::CounterResponse(r) => Ok(r),
        other => Err(unexpected(AgentId::CounterArgument, &other)),
    }
}

fn expect_evaluation(payload: Payload) -> CoordinatorResult<EvaluationResponse> {
    match payload {
        Payload::EvaluationResponse(r) => Ok(r),
        other => Err(unexpected(AgentId::EvaluationAgent, &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::llm::LlmService;
    use crate::retrieval::NoRetriever;

    fn coordinator() -> DebateCoordinator {
        let llm = Arc::new(LlmService::new(LlmConfig::simulated()).unwrap());
        DebateCoordinator::new(llm, Arc::new(NoRetriever), PipelineConfig::default())
    }

    #[tokio::test]
    async fn test_empty_debate_id_is_rejected() {
        let c = coordinator();
        let err = c
            .process_debate_turn("  ", "Some argument", TurnContext::new("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::InvalidDebateId));
        assert!(c.debate_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_simulated_turn_is_recorded() {
        let c = coordinator();
        let result = c
            .process_debate_turn("d-1", "Renewable energy reduces emissions", TurnContext::new("Energy"))
            .await
            .unwrap();

        assert_eq!(result.round, 1);
        assert_eq!(result.total_rounds, 1);
        assert_eq!(result.debate_context.previous_rounds, 0);
        assert!(result.ai_argument.starts_with("[Simulated response to:"));
        assert_eq!(result.keywords[0], "renewable");
        assert_eq!(result.agent_status.len(), 4);
        assert_eq!(c.round_count("d-1").await, 1);
        assert_eq!(c.debate_ids().await, vec!["d-1".to_string()]);
    }

    #[tokio::test]
    async fn test_generate_argument_uses_argument_agent() {
        let c = coordinator();
        let response = c
            .generate_argument("School uniforms", Some("against"), vec!["cost".to_string()])
            .await
            .unwrap();
        assert!(response.argument.starts_with("[Simulated response to:"));
        assert!(response.evidence_used.is_empty());

        let status = &c.get_all_agent_status()[&AgentId::ArgumentGenerator];
        assert_eq!(status.messages_processed, 1);
    }

    #[tokio::test]
    async fn test_unknown_debate_queries_are_empty() {
        let c = coordinator();
        assert!(c.get_debate_history("nope").await.is_empty());
        assert_eq!(c.round_count("nope").await, 0);
        let scores = c.calculate_cumulative_scores("nope").await;
        assert_eq!(scores.rounds, 0);
        assert_eq!(scores.human_average, 0.0);
    }
}
