//! Argument generation: retrieve evidence, prompt, then a lexical pass over
//! the result.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::llm::{GenerationOptions, TextGenerator};
use crate::prompts;
use crate::retrieval::{Evidence, Retriever};
use crate::text::{contains_any, preview, split_sentences, word_count};

const EVIDENCE_MARKERS: &[&str] = &["research", "study", "data", "evidence"];
const REASONING_MARKERS: &[&str] = &["because", "therefore", "thus", "hence"];

/// Keywords quoted in the prompt.
const PROMPT_KEYWORDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArgumentRequest {
    pub topic: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub stance: Option<String>,
    #[serde(default)]
    pub context: BTreeMap<String, Value>,
}

/// Shallow lexical profile of a generated argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArgumentStructure {
    pub sentence_count: usize,
    pub word_count: usize,
    pub has_evidence: bool,
    pub has_reasoning: bool,
}

impl ArgumentStructure {
    pub fn analyze(argument: &str) -> Self {
        let lower = argument.to_lowercase();
        Self {
            sentence_count: split_sentences(argument).len(),
            word_count: word_count(argument),
            has_evidence: contains_any(&lower, EVIDENCE_MARKERS),
            has_reasoning: contains_any(&lower, REASONING_MARKERS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentResponse {
    pub argument: String,
    pub evidence_used: Vec<Evidence>,
    pub structure: ArgumentStructure,
}

pub struct ArgumentGenerator {
    llm: Arc<dyn TextGenerator>,
    retriever: Arc<dyn Retriever>,
    config: PipelineConfig,
}

impl ArgumentGenerator {
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        retriever: Arc<dyn Retriever>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            llm,
            retriever,
            config,
        }
    }

    pub async fn generate(&self, request: &ArgumentRequest) -> ArgumentResponse {
        let evidence = self
            .retriever
            .retrieve(&request.topic, &request.keywords, self.config.evidence_results)
            .await;
        debug!(topic = %request.topic, evidence = evidence.len(), "Evidence gathered");

        let excerpts: Vec<String> = evidence
            .iter()
            .take(self.config.evidence_in_prompt)
            .map(|e| preview(&e.content, self.config.evidence_excerpt_chars).to_string())
            .collect();
        let keywords: Vec<String> = request.keywords.iter().take(PROMPT_KEYWORDS).cloned().collect();
        let stance = request.stance.as_deref().unwrap_or(prompts::DEFAULT_STANCE);

        let prompt = prompts::argument_prompt(&request.topic, stance, &keywords, &excerpts);
        let argument = self
            .llm
            .generate(&prompt, &GenerationOptions::new(500, 0.7))
            .await
            .trim()
            .to_string();

        ArgumentResponse {
            structure: ArgumentStructure::analyze(&argument),
            argument,
            evidence_used: evidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockTextGenerator;
    use crate::retrieval::{Document, NoRetriever};
    use async_trait::async_trait;

    struct FixedRetriever(Vec<Evidence>);

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn retrieve(&self, _q: &str, _k: &[String], max_results: usize) -> Vec<Evidence> {
            self.0.iter().take(max_results).cloned().collect()
        }

        async fn add_documents(&self, _documents: Vec<Document>) -> usize {
            0
        }
    }

    fn evidence(content: &str) -> Evidence {
        Evidence {
            content: content.to_string(),
            metadata: BTreeMap::new(),
            relevance_score: 0.9,
        }
    }

    #[test]
    fn test_structure_analysis() {
        let s = ArgumentStructure::analyze(
            "Research shows costs fell. Therefore adoption grows. Prices matter",
        );
        assert_eq!(s.sentence_count, 3);
        assert_eq!(s.word_count, 9);
        assert!(s.has_evidence);
        assert!(s.has_reasoning);

        let plain = ArgumentStructure::analyze("");
        assert_eq!(plain.sentence_count, 0);
        assert!(!plain.has_evidence);
    }

    #[tokio::test]
    async fn test_prompt_carries_evidence_and_output_is_trimmed() {
        let mut llm = MockTextGenerator::new();
        llm.expect_generate()
            .withf(|prompt, opts| {
                prompt.contains("Stance: against")
                    && prompt.contains(&format!("{}...", "e".repeat(200)))
                    && !prompt.contains(&"e".repeat(201))
                    && !prompt.contains("fourth")
                    && opts.max_tokens == 500
            })
            .times(1)
            .returning(|_, _| "  Wind is cheap because data says so.  ".to_string());

        let retriever = FixedRetriever(vec![
            evidence(&"e".repeat(300)),
            evidence("second"),
            evidence("third"),
            evidence("fourth"),
        ]);
        let generator = ArgumentGenerator::new(
            Arc::new(llm),
            Arc::new(retriever),
            PipelineConfig::default(),
        );

        let response = generator
            .generate(&ArgumentRequest {
                topic: "Wind power".to_string(),
                keywords: vec!["wind".to_string()],
                stance: Some("against".to_string()),
                context: BTreeMap::new(),
            })
            .await;

        assert_eq!(response.argument, "Wind is cheap because data says so.");
        assert_eq!(response.evidence_used.len(), 4);
        assert!(response.structure.has_evidence);
        assert!(response.structure.has_reasoning);
    }

    #[tokio::test]
    async fn test_no_evidence_placeholder() {
        let mut llm = MockTextGenerator::new();
        llm.expect_generate()
            .withf(|prompt, _| prompt.contains(prompts::NO_EVIDENCE) && prompt.contains("supporting"))
            .returning(|_, _| "An argument.".to_string());

        let generator =
            ArgumentGenerator::new(Arc::new(llm), Arc::new(NoRetriever), PipelineConfig::default());
        let response = generator
            .generate(&ArgumentRequest {
                topic: "Tea".to_string(),
                ..Default::default()
            })
            .await;
        assert!(response.evidence_used.is_empty());
        assert_eq!(response.structure.sentence_count, 1);
    }
}
