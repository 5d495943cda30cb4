//! Keyword extraction.
//!
//! Three independent rankings over the same text, merged by positional score:
//!
//! 1. significant words: alphanumeric tokens longer than three characters,
//!    stop words removed, ranked by frequency
//! 2. broad words: every alphabetic run of four or more letters, stop words
//!    removed, ranked by frequency
//! 3. entities: capitalised phrases (`New York`, `Paris`)
//!
//! In each list the i-th item earns `len - i` points. Points accumulate per
//! lowercased keyword and the merged ranking sorts by points, descending,
//! keeping first-occurrence order on ties.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

static BROAD_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]{4,}\b").expect("BROAD_WORD_RE regex should compile"));

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").expect("ENTITY_RE regex should compile")
});

/// English stop words.
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
        "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
        "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
        "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
        "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be", "been",
        "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an", "the",
        "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
        "with", "about", "against", "between", "into", "through", "during", "before", "after",
        "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
        "again", "further", "then", "once", "here", "there", "when", "where", "why", "how",
        "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
        "will", "just", "don", "don't", "should", "should've", "now", "d", "ll", "m", "o", "re",
        "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn", "didn't", "doesn",
        "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't", "ma",
        "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
        "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
        "wouldn't",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRequest {
    pub text: String,
    pub max_keywords: usize,
}

/// A capitalised span that looks like a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeywordResponse {
    pub keywords: Vec<String>,
    pub entities: Vec<Entity>,
    /// Size of the merged ranking before truncation.
    pub keyword_count: usize,
}

/// Stateless extractor; all state lives in the agent wrapper.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordExtractor;

impl KeywordExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, request: &KeywordRequest) -> KeywordResponse {
        let max = request.max_keywords;
        let significant = significant_words(&request.text, max);
        let broad = broad_words(&request.text, max);
        let entities = extract_entities(&request.text);
        let entity_texts: Vec<String> = entities.iter().map(|e| e.text.clone()).collect();

        let merged = merge_ranked(&[significant, broad, entity_texts]);
        debug!(
            merged = merged.len(),
            entities = entities.len(),
            "Keyword rankings merged"
        );

        KeywordResponse {
            keyword_count: merged.len(),
            keywords: merged.into_iter().take(max).collect(),
            entities,
        }
    }
}

/// Merge ranked lists: the i-th of `n` items scores `n - i`, scores sum per
/// lowercased key, result sorted by score descending with ties kept in
/// first-occurrence order.
pub fn merge_ranked(lists: &[Vec<String>]) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut scores: HashMap<String, usize> = HashMap::new();

    for list in lists {
        let len = list.len();
        for (i, keyword) in list.iter().enumerate() {
            let key = keyword.to_lowercase();
            match scores.get_mut(&key) {
                Some(score) => *score += len - i,
                None => {
                    scores.insert(key.clone(), len - i);
                    order.push(key);
                }
            }
        }
    }

    // `sort_by` is stable, so equal scores keep first-occurrence order.
    order.sort_by(|a, b| scores[b].cmp(&scores[a]));
    order
}

/// Most frequent items, first occurrence breaking ties.
fn rank_by_frequency<'a>(words: impl Iterator<Item = &'a str>, max: usize) -> Vec<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in words {
        let count = counts.entry(word).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.into_iter().take(max).map(str::to_string).collect()
}

fn significant_words(text: &str, max: usize) -> Vec<String> {
    let lower = text.to_lowercase();
    let words = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 3 && !STOP_WORDS.contains(w));
    rank_by_frequency(words, max)
}

fn broad_words(text: &str, max: usize) -> Vec<String> {
    let lower = text.to_lowercase();
    let words = BROAD_WORD_RE
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| !STOP_WORDS.contains(w));
    rank_by_frequency(words, max)
}

/// Capitalised phrases, deduplicated in first-occurrence order.
pub fn extract_entities(text: &str) -> Vec<Entity> {
    let mut seen = HashSet::new();
    ENTITY_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|span| seen.insert(*span))
        .map(|span| Entity {
            text: span.to_string(),
            entity_type: "ENTITY".to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_ranked_tie_keeps_first_occurrence() {
        let merged = merge_ranked(&[strings(&["x", "y"]), strings(&["y", "z"]), strings(&["x"])]);
        assert_eq!(merged, strings(&["x", "y", "z"]));
    }

    #[test]
    fn test_merge_ranked_is_case_insensitive() {
        let merged = merge_ranked(&[strings(&["solar", "wind"]), strings(&["Wind"])]);
        // wind = 1 + 1, solar = 2; tie keeps solar first.
        assert_eq!(merged, strings(&["solar", "wind"]));
    }

    #[test]
    fn test_significant_words_filters_and_ranks() {
        let words = significant_words("The carbon tax is a carbon price, not a ban on cars.", 10);
        assert_eq!(words, strings(&["carbon", "price", "cars"]));
    }

    #[test]
    fn test_broad_words_requires_four_letters() {
        let words = broad_words("Wind is cheap; wind and sun are abundant", 10);
        assert_eq!(words, strings(&["wind", "cheap", "abundant"]));
    }

    #[test]
    fn test_entities_dedupe_in_order() {
        let entities = extract_entities("Paris and New York both met. Paris led.");
        let texts: Vec<&str> = entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Paris", "New York"]);
        assert!(entities.iter().all(|e| e.entity_type == "ENTITY"));
    }

    #[test]
    fn test_extract_truncates_but_reports_full_count() {
        let response = KeywordExtractor::new().extract(&KeywordRequest {
            text: "Solar power beats coal in Germany".to_string(),
            max_keywords: 2,
        });
        // solar = 2 + 2 + 2, power = 1 + 1, germany = 1 (entity list only)
        assert_eq!(response.keywords, strings(&["solar", "power"]));
        assert_eq!(response.keyword_count, 3);
        assert_eq!(response.entities.len(), 2);
    }

    #[test]
    fn test_extract_empty_text() {
        let response = KeywordExtractor::new().extract(&KeywordRequest {
            text: String::new(),
            max_keywords: 10,
        });
        assert!(response.keywords.is_empty());
        assert_eq!(response.keyword_count, 0);
    }
}
