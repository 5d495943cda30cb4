//! Counter-argument generation.
//!
//! Two generation passes per request: first the opponent's weaknesses, then
//! a round-aware rebuttal that folds in a digest of earlier rounds. Framing
//! escalates with the round (open strong, then answer the rebuttal, then
//! synthesize).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::debate::state::DebateTurn;
use crate::llm::{GenerationOptions, TextGenerator};
use crate::prompts::{self, RoundDigest};
use crate::text::contains_any;

/// Lines at or under this length are discarded as filler.
const MIN_WEAKNESS_CHARS: usize = 20;

/// Leading list markers stripped from weakness lines.
const LIST_MARKERS: &[char] = &['-', '•', '1', '2', '3', '4', '5', '6', '7', '8', '9', '.', ' '];

const STRATEGY_MARKERS: &[(&str, &[&str])] = &[
    ("concession_refutation", &["however", "although", "while"]),
    ("evidence_based", &["evidence", "research", "data"]),
    ("logical_analysis", &["logic", "reasoning", "fallacy"]),
];

const DEFAULT_STRATEGY: &str = "direct_rebuttal";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CounterRequest {
    pub opponent_argument: String,
    pub topic: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub context: BTreeMap<String, Value>,
    /// Every completed turn of this debate, oldest first.
    #[serde(default)]
    pub debate_history: Vec<DebateTurn>,
    pub round_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterResponse {
    pub counter_argument: String,
    pub identified_weaknesses: Vec<String>,
    pub strategy: String,
    pub round: u32,
}

pub struct CounterArgumentGenerator {
    llm: Arc<dyn TextGenerator>,
    config: PipelineConfig,
}

impl CounterArgumentGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>, config: PipelineConfig) -> Self {
        Self { llm, config }
    }

    pub async fn generate(&self, request: &CounterRequest) -> CounterResponse {
        let weaknesses = self.identify_weaknesses(&request.opponent_argument).await;

        let digests: Vec<RoundDigest<'_>> = request
            .debate_history
            .iter()
            .map(|turn| RoundDigest {
                human_argument: &turn.human_argument,
                ai_argument: &turn.ai_argument,
            })
            .collect();
        let history = prompts::history_digest(&digests, self.config.history_preview_chars);

        debug!(
            round = request.round_number,
            prior_rounds = request.debate_history.len(),
            weaknesses = weaknesses.len(),
            "Building counter-argument"
        );

        let prompt = prompts::counter_prompt(
            &request.topic,
            &request.opponent_argument,
            request.round_number,
            &history,
            &weaknesses,
        );
        let options = GenerationOptions::new(700, 0.8).with_system_prompt(
            prompts::counter_system_prompt(&request.topic, request.round_number),
        );
        let counter_argument = self.llm.generate(&prompt, &options).await.trim().to_string();

        CounterResponse {
            strategy: classify_strategy(&counter_argument),
            counter_argument,
            identified_weaknesses: weaknesses,
            round: request.round_number,
        }
    }

    async fn identify_weaknesses(&self, argument: &str) -> Vec<String> {
        let raw = self
            .llm
            .generate(&prompts::weakness_prompt(argument), &GenerationOptions::new(250, 0.7))
            .await;
        parse_weaknesses(&raw, self.config.max_weaknesses)
    }
}

/// Substantive lines of a weakness listing, list markers removed.
pub fn parse_weaknesses(raw: &str, max: usize) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > MIN_WEAKNESS_CHARS)
        .map(|line| line.trim_start_matches(LIST_MARKERS).to_string())
        .take(max)
        .collect()
}

/// Rhetorical strategies detected by lexical markers, comma-joined.
pub fn classify_strategy(counter_argument: &str) -> String {
    let lower = counter_argument.to_lowercase();
    let found: Vec<&str> = STRATEGY_MARKERS
        .iter()
        .filter(|(_, markers)| contains_any(&lower, markers))
        .map(|(name, _)| *name)
        .collect();
    if found.is_empty() {
        DEFAULT_STRATEGY.to_string()
    } else {
        found.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::evaluator::EvaluationResponse;
    use crate::llm::MockTextGenerator;

    fn prior_turn(round: u32, human: &str, ai: &str) -> DebateTurn {
        DebateTurn::new(
            round,
            human.to_string(),
            ai.to_string(),
            Vec::new(),
            EvaluationResponse::default(),
        )
    }

    #[test]
    fn test_parse_weaknesses_filters_and_strips() {
        let raw = "Weaknesses:\n\
                   1. Ignores the cost of grid storage entirely\n\
                   - Too short line\n\
                   • Assumes every country has the same sunlight\n\
                   2. Relies on a single outdated survey from 2009\n\
                   3. Overlooks the mining footprint of panels";
        let parsed = parse_weaknesses(raw, 3);
        assert_eq!(
            parsed,
            vec![
                "Ignores the cost of grid storage entirely",
                "Assumes every country has the same sunlight",
                "Relies on a single outdated survey from 2009",
            ]
        );
    }

    #[test]
    fn test_classify_strategy() {
        assert_eq!(classify_strategy("Plainly wrong."), "direct_rebuttal");
        assert_eq!(
            classify_strategy("However, the data disagrees."),
            "concession_refutation, evidence_based"
        );
        assert_eq!(classify_strategy("A textbook fallacy."), "logical_analysis");
    }

    #[tokio::test]
    async fn test_round_three_prompt_includes_history_and_synthesis() {
        let mut llm = MockTextGenerator::new();
        llm.expect_generate()
            .withf(|_, opts| opts.max_tokens == 250)
            .times(1)
            .returning(|_, _| "- The claim ignores intermittency of supply".to_string());
        llm.expect_generate()
            .withf(|prompt, opts| {
                opts.max_tokens == 700
                    && opts.system_prompt.as_deref().is_some_and(|s| s.contains("round 3"))
                    && prompt.contains("Round 1:")
                    && prompt.contains("Round 2:")
                    && !prompt.contains("Round 3:")
                    && prompt.contains("Synthesize")
                    && prompt.contains("- The claim ignores intermittency of supply")
            })
            .times(1)
            .returning(|_, _| " Although wind is clean, research shows gaps. ".to_string());

        let generator = CounterArgumentGenerator::new(Arc::new(llm), PipelineConfig::default());
        let response = generator
            .generate(&CounterRequest {
                opponent_argument: "Wind is reliable".to_string(),
                topic: "Wind power".to_string(),
                debate_history: vec![
                    prior_turn(1, "first human", "first ai"),
                    prior_turn(2, "second human", "second ai"),
                ],
                round_number: 3,
                ..Default::default()
            })
            .await;

        assert_eq!(response.round, 3);
        assert_eq!(response.counter_argument, "Although wind is clean, research shows gaps.");
        assert_eq!(response.strategy, "concession_refutation, evidence_based");
        assert_eq!(response.identified_weaknesses.len(), 1);
    }

    #[tokio::test]
    async fn test_first_round_opens_strong_without_history() {
        let mut llm = MockTextGenerator::new();
        llm.expect_generate()
            .withf(|_, opts| opts.max_tokens == 250)
            .returning(|_, _| "short".to_string());
        llm.expect_generate()
            .withf(|prompt, _| {
                prompt.contains("Open strong")
                    && !prompt.contains("Previous rounds")
                    && prompt.contains("- General logical gaps")
            })
            .returning(|_, _| "No.".to_string());

        let generator = CounterArgumentGenerator::new(Arc::new(llm), PipelineConfig::default());
        let response = generator
            .generate(&CounterRequest {
                opponent_argument: "Cats rule".to_string(),
                topic: "Pets".to_string(),
                round_number: 1,
                ..Default::default()
            })
            .await;
        assert!(response.identified_weaknesses.is_empty());
        assert_eq!(response.strategy, "direct_rebuttal");
    }
}
