//! Argument evaluation.
//!
//! Four criteria are lexical and deterministic; persuasiveness is asked of
//! the text generator and therefore varies between runs. The mix is
//! intentional and kept.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm::{GenerationOptions, TextGenerator};
use crate::prompts;
use crate::scoring::{RoundWinner, ScoreCard, MAX_SCORE};
use crate::text::{count_markers, split_sentences, word_count};

const LOGICAL_CONNECTORS: &[&str] = &[
    "therefore",
    "thus",
    "hence",
    "because",
    "since",
    "consequently",
];
const CONCESSION_WORDS: &[&str] = &["but", "however", "although"];
const EVIDENCE_WORDS: &[&str] = &[
    "research",
    "study",
    "data",
    "evidence",
    "statistics",
    "findings",
    "survey",
];
const CITATION_MARKERS: &[&str] = &["(", "according to", "states that"];

const CONCESSION_CAP: f64 = 1.5;
const NEUTRAL_PERSUASIVENESS: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub human_argument: String,
    pub ai_argument: String,
    pub topic: String,
    pub round: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub human_scores: ScoreCard,
    pub ai_scores: ScoreCard,
    pub feedback: String,
    pub round_winner: RoundWinner,
    pub round: u32,
}

pub struct Evaluator {
    llm: Arc<dyn TextGenerator>,
}

impl Evaluator {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    pub async fn evaluate(&self, request: &EvaluationRequest) -> EvaluationResponse {
        // Human side first, then AI; the persuasiveness calls follow that order.
        let human_scores = self.score(&request.human_argument, &request.topic).await;
        let ai_scores = self.score(&request.ai_argument, &request.topic).await;

        let feedback = self
            .llm
            .generate(
                &prompts::feedback_prompt(
                    &request.human_argument,
                    human_scores.total(),
                    &request.ai_argument,
                    ai_scores.total(),
                ),
                &GenerationOptions::new(150, 0.7),
            )
            .await
            .trim()
            .to_string();

        EvaluationResponse {
            round_winner: RoundWinner::decide(human_scores.total(), ai_scores.total()),
            human_scores,
            ai_scores,
            feedback,
            round: request.round,
        }
    }

    async fn score(&self, argument: &str, topic: &str) -> ScoreCard {
        ScoreCard::new(
            logical_coherence(argument),
            evidence_quality(argument),
            self.persuasiveness(argument, topic).await,
            clarity(argument),
            relevance(argument, topic),
        )
    }

    async fn persuasiveness(&self, argument: &str, topic: &str) -> f64 {
        let raw = self
            .llm
            .generate(
                &prompts::persuasiveness_prompt(topic, argument),
                &GenerationOptions::new(10, 0.3),
            )
            .await;
        match parse_score(&raw) {
            Some(score) => score,
            None => {
                warn!(response = %raw, "Unparseable persuasiveness score, using neutral default");
                NEUTRAL_PERSUASIVENESS
            }
        }
    }
}

/// First whitespace token as a finite number, clamped into `[0, 10]`.
pub fn parse_score(raw: &str) -> Option<f64> {
    let token = raw.split_whitespace().next()?;
    let value: f64 = token.parse().ok()?;
    value.is_finite().then(|| value.clamp(0.0, MAX_SCORE))
}

pub fn logical_coherence(argument: &str) -> f64 {
    let lower = argument.to_lowercase();
    let connectors = count_markers(&lower, LOGICAL_CONNECTORS) as f64 * 0.5;
    let concessions = (count_markers(&lower, CONCESSION_WORDS) as f64 * 0.3).min(CONCESSION_CAP);
    (5.0 + connectors + concessions).min(MAX_SCORE)
}

pub fn evidence_quality(argument: &str) -> f64 {
    let lower = argument.to_lowercase();
    let mut score = 3.0 + count_markers(&lower, EVIDENCE_WORDS) as f64 * 0.8;
    // Citation markers are matched case-sensitively against the raw text.
    if CITATION_MARKERS.iter().any(|m| argument.contains(m)) {
        score += 2.0;
    }
    score.min(MAX_SCORE)
}

pub fn clarity(argument: &str) -> f64 {
    let sentences = split_sentences(argument);
    let words: usize = sentences.iter().map(|s| word_count(s)).sum();
    let average = words as f64 / sentences.len().max(1) as f64;

    let mut score: f64 = 5.0;
    if (15.0..=25.0).contains(&average) {
        score += 2.0;
    } else if average > 35.0 {
        score -= 1.0;
    }
    if sentences.len() >= 3 {
        score += 1.0;
    }
    score.min(MAX_SCORE)
}

pub fn relevance(argument: &str, topic: &str) -> f64 {
    let topic_lower = topic.to_lowercase();
    let argument_lower = argument.to_lowercase();
    let topic_words: HashSet<&str> = topic_lower.split_whitespace().collect();
    let argument_words: HashSet<&str> = argument_lower.split_whitespace().collect();
    let overlap = topic_words.intersection(&argument_words).count();
    (5.0 + overlap as f64 * 0.5).min(MAX_SCORE)
}
