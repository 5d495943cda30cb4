//! Debate agents: one stateful wrapper, four fixed roles.
//!
//! Every role sits behind the same request/response contract:
//!
//! ```text
//! receive_message(msg) ─▶ append msg to history
//!                         ├─ Request  → process(payload) → Some(reply)
//!                         └─ Response → None
//! ```
//!
//! The roles form a closed set ([`AgentRole`]) chosen when the
//! [`AgentRegistry`] is built; dispatch is a `match`, not a vtable.

pub mod argument;
pub mod counter;
pub mod evaluator;
pub mod keywords;

pub use argument::{ArgumentGenerator, ArgumentRequest, ArgumentResponse, ArgumentStructure};
pub use counter::{CounterArgumentGenerator, CounterRequest, CounterResponse};
pub use evaluator::{EvaluationRequest, EvaluationResponse, Evaluator};
pub use keywords::{merge_ranked, Entity, KeywordExtractor, KeywordRequest, KeywordResponse};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::llm::TextGenerator;
use crate::message::{AgentId, AgentMessage, MessageType, Payload};
use crate::retrieval::Retriever;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent {agent} cannot process a {kind} payload")]
    UnsupportedPayload { agent: AgentId, kind: &'static str },
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Whether an agent has work in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Idle,
    Processing,
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Processing => write!(f, "processing"),
        }
    }
}

/// Observability snapshot; never used for control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub agent_id: AgentId,
    pub name: String,
    pub state: AgentState,
    pub capabilities: Vec<String>,
    /// Every message received, requests and responses alike.
    pub messages_processed: usize,
}

/// Concrete behaviour behind an [`Agent`].
pub enum AgentRole {
    KeywordExtractor(KeywordExtractor),
    ArgumentGenerator(ArgumentGenerator),
    CounterArgument(CounterArgumentGenerator),
    Evaluator(Evaluator),
}

impl AgentRole {
    pub fn agent_id(&self) -> AgentId {
        match self {
            Self::KeywordExtractor(_) => AgentId::KeywordExtractor,
            Self::ArgumentGenerator(_) => AgentId::ArgumentGenerator,
            Self::CounterArgument(_) => AgentId::CounterArgument,
            Self::Evaluator(_) => AgentId::EvaluationAgent,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::KeywordExtractor(_) => "Keyword Extractor",
            Self::ArgumentGenerator(_) => "Argument Generator",
            Self::CounterArgument(_) => "Counter-Argument Generator",
            Self::Evaluator(_) => "Evaluation Agent",
        }
    }

    /// Informational tags; not checked at dispatch.
    pub fn capabilities(&self) -> &'static [&'static str] {
        match self {
            Self::KeywordExtractor(_) => &[
                "keyword_extraction",
                "entity_recognition",
                "concept_identification",
            ],
            Self::ArgumentGenerator(_) => &[
                "argument_generation",
                "evidence_synthesis",
                "logical_structuring",
            ],
            Self::CounterArgument(_) => &[
                "counter_argument_generation",
                "weakness_identification",
                "rebuttal_creation",
            ],
            Self::Evaluator(_) => &["argument_evaluation", "scoring", "feedback_generation"],
        }
    }
}

/// Decrements the in-flight counter on drop, including on early return.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A role plus its message log and in-flight state.
///
/// State is a counter rather than a flag: two debates may call the same
/// agent at once, and the agent stays `Processing` until both finish.
pub struct Agent {
    role: AgentRole,
    history: Mutex<Vec<AgentMessage>>,
    in_flight: AtomicUsize,
}

impl Agent {
    pub fn new(role: AgentRole) -> Self {
        Self {
            role,
            history: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn agent_id(&self) -> AgentId {
        self.role.agent_id()
    }

    pub fn name(&self) -> &'static str {
        self.role.name()
    }

    pub fn state(&self) -> AgentState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            AgentState::Processing
        } else {
            AgentState::Idle
        }
    }

    /// Run the role on a request payload.
    pub async fn process(&self, input: Payload) -> AgentResult<Payload> {
        let _guard = InFlight::enter(&self.in_flight);
        info!(agent = %self.agent_id(), kind = input.kind(), "Processing");

        match (&self.role, input) {
            (AgentRole::KeywordExtractor(extractor), Payload::KeywordRequest(req)) => {
                Ok(Payload::KeywordResponse(extractor.extract(&req)))
            }
            (AgentRole::ArgumentGenerator(generator), Payload::ArgumentRequest(req)) => {
                Ok(Payload::ArgumentResponse(generator.generate(&req).await))
            }
            (AgentRole::CounterArgument(generator), Payload::CounterRequest(req)) => {
                Ok(Payload::CounterResponse(generator.generate(&req).await))
            }
            (AgentRole::Evaluator(evaluator), Payload::EvaluationRequest(req)) => {
                Ok(Payload::EvaluationResponse(evaluator.evaluate(&req).await))
            }
            (_, other) => Err(AgentError::UnsupportedPayload {
                agent: self.agent_id(),
                kind: other.kind(),
            }),
        }
    }

    /// Log `message`; answer it if it is a request.
    pub async fn receive_message(&self, message: AgentMessage) -> AgentResult<Option<AgentMessage>> {
        debug!(
            agent = %self.agent_id(),
            sender = %message.sender(),
            correlation_id = %message.correlation_id(),
            message_type = %message.message_type(),
            "Message received"
        );
        self.lock_history().push(message.clone());

        if message.message_type() != MessageType::Request {
            return Ok(None);
        }
        let output = self.process(message.content().clone()).await?;
        Ok(Some(message.reply(output)))
    }

    pub fn get_status(&self) -> AgentStatus {
        AgentStatus {
            agent_id: self.agent_id(),
            name: self.name().to_string(),
            state: self.state(),
            capabilities: self
                .role
                .capabilities()
                .iter()
                .map(|c| c.to_string())
                .collect(),
            messages_processed: self.lock_history().len(),
        }
    }

    /// Copy of the message log, oldest first.
    pub fn message_history(&self) -> Vec<AgentMessage> {
        self.lock_history().clone()
    }

    fn lock_history(&self) -> MutexGuard<'_, Vec<AgentMessage>> {
        // The log is append-only; a panic mid-push leaves it usable.
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The fixed set of agents a coordinator drives.
pub struct AgentRegistry {
    agents: BTreeMap<AgentId, Agent>,
}

impl AgentRegistry {
    /// Build every role over shared collaborators.
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        retriever: Arc<dyn Retriever>,
        config: &PipelineConfig,
    ) -> Self {
        let roles = [
            AgentRole::KeywordExtractor(KeywordExtractor::new()),
            AgentRole::ArgumentGenerator(ArgumentGenerator::new(
                Arc::clone(&llm),
                retriever,
                config.clone(),
            )),
            AgentRole::CounterArgument(CounterArgumentGenerator::new(
                Arc::clone(&llm),
                config.clone(),
            )),
            AgentRole::Evaluator(Evaluator::new(llm)),
        ];
        let agents = roles
            .into_iter()
            .map(|role| (role.agent_id(), Agent::new(role)))
            .collect();
        Self { agents }
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn statuses(&self) -> BTreeMap<AgentId, AgentStatus> {
        self.agents
            .iter()
            .map(|(id, agent)| (*id, agent.get_status()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockTextGenerator;
    use crate::retrieval::NoRetriever;

    fn keyword_agent() -> Agent {
        Agent::new(AgentRole::KeywordExtractor(KeywordExtractor::new()))
    }

    fn keyword_message(message_type_request: bool) -> AgentMessage {
        let request = AgentMessage::request(
            AgentId::Coordinator,
            AgentId::KeywordExtractor,
            Payload::KeywordRequest(KeywordRequest {
                text: "Nuclear energy is reliable energy".to_string(),
                max_keywords: 5,
            }),
            "corr-42",
        );
        if message_type_request {
            request
        } else {
            request.reply(Payload::KeywordResponse(KeywordResponse::default()))
        }
    }

    #[tokio::test]
    async fn test_request_is_answered_with_same_correlation() {
        let agent = keyword_agent();
        let reply = agent
            .receive_message(keyword_message(true))
            .await
            .unwrap()
            .expect("requests get a reply");

        assert_eq!(reply.correlation_id(), "corr-42");
        assert_eq!(reply.sender(), AgentId::KeywordExtractor);
        assert_eq!(reply.receiver(), AgentId::Coordinator);
        match reply.content() {
            Payload::KeywordResponse(resp) => assert_eq!(resp.keywords[0], "energy"),
            other => panic!("unexpected payload {}", other.kind()),
        }
        assert_eq!(agent.state(), AgentState::Idle);
    }

    #[tokio::test]
    async fn test_non_request_is_logged_but_not_answered() {
        let agent = keyword_agent();
        let reply = agent.receive_message(keyword_message(false)).await.unwrap();
        assert!(reply.is_none());
        assert_eq!(agent.get_status().messages_processed, 1);
        assert_eq!(agent.message_history().len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_payload_is_rejected_and_still_logged() {
        let agent = keyword_agent();
        let message = AgentMessage::request(
            AgentId::Coordinator,
            AgentId::KeywordExtractor,
            Payload::EvaluationRequest(EvaluationRequest::default()),
            "corr-1",
        );
        let err = agent.receive_message(message).await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::UnsupportedPayload {
                agent: AgentId::KeywordExtractor,
                kind: "evaluation_request"
            }
        ));
        assert_eq!(agent.get_status().messages_processed, 1);
        assert_eq!(agent.state(), AgentState::Idle);
    }

    #[test]
    fn test_status_snapshot() {
        let status = keyword_agent().get_status();
        assert_eq!(status.name, "Keyword Extractor");
        assert_eq!(status.state, AgentState::Idle);
        assert_eq!(status.messages_processed, 0);
        assert!(status.capabilities.contains(&"entity_recognition".to_string()));

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["agent_id"], "keyword_extractor");
        assert_eq!(json["state"], "idle");
    }

    #[test]
    fn test_in_flight_guard_tracks_overlap() {
        let agent = keyword_agent();
        let first = InFlight::enter(&agent.in_flight);
        let second = InFlight::enter(&agent.in_flight);
        assert_eq!(agent.state(), AgentState::Processing);
        drop(first);
        assert_eq!(agent.state(), AgentState::Processing);
        drop(second);
        assert_eq!(agent.state(), AgentState::Idle);
    }

    #[test]
    fn test_registry_holds_all_roles() {
        let registry = AgentRegistry::new(
            Arc::new(MockTextGenerator::new()),
            Arc::new(NoRetriever),
            &PipelineConfig::default(),
        );
        let ids: Vec<AgentId> = registry.statuses().into_keys().collect();
        assert_eq!(
            ids,
            vec![
                AgentId::KeywordExtractor,
                AgentId::ArgumentGenerator,
                AgentId::CounterArgument,
                AgentId::EvaluationAgent,
            ]
        );
        assert!(registry.get(AgentId::Coordinator).is_none());
        assert_eq!(registry.iter().count(), 4);
    }
}
