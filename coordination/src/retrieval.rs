//! Evidence retrieval for the argument generator.
//!
//! [`Retriever`] never fails outward: an unreachable store or a broken
//! embedding yields an empty or zero-scored result, not an error.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::llm::TextGenerator;

/// Keywords appended to the query before embedding.
const QUERY_KEYWORDS: usize = 3;

/// One ranked snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub relevance_score: f64,
}

/// Source text to index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `max_results` snippets, best first.
    async fn retrieve(&self, query: &str, keywords: &[String], max_results: usize) -> Vec<Evidence>;

    /// Index documents. Returns how many were added.
    async fn add_documents(&self, documents: Vec<Document>) -> usize;
}

/// Retriever for deployments without a store.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRetriever;

#[async_trait]
impl Retriever for NoRetriever {
    async fn retrieve(&self, _query: &str, _keywords: &[String], _max_results: usize) -> Vec<Evidence> {
        Vec::new()
    }

    async fn add_documents(&self, _documents: Vec<Document>) -> usize {
        0
    }
}

struct IndexedDocument {
    document: Document,
    embedding: Vec<f32>,
}

/// In-process vector store ranked by cosine similarity.
pub struct VectorRetriever {
    embedder: Arc<dyn TextGenerator>,
    documents: RwLock<Vec<IndexedDocument>>,
}

impl VectorRetriever {
    pub fn new(embedder: Arc<dyn TextGenerator>) -> Self {
        Self {
            embedder,
            documents: RwLock::new(Vec::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.documents.write().await.clear();
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str, keywords: &[String], max_results: usize) -> Vec<Evidence> {
        if max_results == 0 || self.is_empty().await {
            return Vec::new();
        }

        let mut full_query = query.to_string();
        for keyword in keywords.iter().take(QUERY_KEYWORDS) {
            full_query.push(' ');
            full_query.push_str(keyword);
        }
        let query_embedding = self.embedder.embed(&full_query).await;

        let documents = self.documents.read().await;
        let mut scored: Vec<Evidence> = documents
            .iter()
            .map(|doc| Evidence {
                content: doc.document.content.clone(),
                metadata: doc.document.metadata.clone(),
                relevance_score: cosine_similarity(&query_embedding, &doc.embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        scored.truncate(max_results);

        debug!(
            query = %full_query,
            candidates = documents.len(),
            returned = scored.len(),
            "Evidence retrieved"
        );
        scored
    }

    async fn add_documents(&self, documents: Vec<Document>) -> usize {
        let documents: Vec<Document> = documents
            .into_iter()
            .filter(|d| !d.content.trim().is_empty())
            .collect();
        let embeddings =
            join_all(documents.iter().map(|d| self.embedder.embed(&d.content))).await;
        let indexed: Vec<IndexedDocument> = documents
            .into_iter()
            .zip(embeddings)
            .map(|(document, embedding)| IndexedDocument {
                document,
                embedding,
            })
            .collect();
        let added = indexed.len();
        self.documents.write().await.extend(indexed);
        added
    }
}

/// Cosine similarity; 0 for zero vectors or mismatched lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::llm::LlmService;

    fn simulated() -> Arc<dyn TextGenerator> {
        Arc::new(LlmService::new(LlmConfig::simulated()).unwrap())
    }

    #[test]
    fn test_cosine_similarity_edges() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn test_no_retriever_is_empty() {
        let r = NoRetriever;
        assert_eq!(r.add_documents(vec![Document::new("text")]).await, 0);
        assert!(r.retrieve("q", &[], 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_vector_retriever_ranks_closest_first() {
        let retriever = VectorRetriever::new(simulated());
        let added = retriever
            .add_documents(vec![
                Document::new("Bread rises when yeast ferments sugar."),
                Document::new("Solar panels convert sunlight into electricity.")
                    .with_metadata("source", "energy.txt"),
                Document::new("   "),
            ])
            .await;
        assert_eq!(added, 2);
        assert_eq!(retriever.len().await, 2);

        let hits = retriever
            .retrieve("solar panels", &["sunlight".to_string()], 5)
            .await;
        assert_eq!(hits.len(), 2);
        assert!(hits[0].content.starts_with("Solar"));
        assert_eq!(hits[0].metadata.get("source").map(String::as_str), Some("energy.txt"));
        assert!(hits[0].relevance_score > hits[1].relevance_score);

        assert_eq!(retriever.retrieve("solar", &[], 1).await.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_empties_store() {
        let retriever = VectorRetriever::new(simulated());
        retriever.add_documents(vec![Document::new("wind")]).await;
        retriever.clear().await;
        assert!(retriever.is_empty().await);
        assert!(retriever.retrieve("wind", &[], 3).await.is_empty());
    }
}
