//! Input handling for the terminal transport: topic validation, line
//! sanitisation, slash commands and evidence files.

use std::path::Path;

use anyhow::{bail, Context, Result};
use debate_coordination::Document;

pub const MIN_TOPIC_CHARS: usize = 5;
pub const MAX_TOPIC_CHARS: usize = 500;
pub const MAX_ARGUMENT_CHARS: usize = 10_000;

/// Markup that has no business in a debate topic.
const FORBIDDEN_PATTERNS: &[&str] = &["<script", "javascript:", "onerror=", "onclick="];

/// Check a debate topic and return it trimmed.
pub fn validate_topic(raw: &str) -> Result<String> {
    let topic = raw.trim();
    let len = topic.chars().count();
    if len < MIN_TOPIC_CHARS {
        bail!("topic must be at least {MIN_TOPIC_CHARS} characters");
    }
    if len > MAX_TOPIC_CHARS {
        bail!("topic must be at most {MAX_TOPIC_CHARS} characters");
    }
    let lowered = topic.to_lowercase();
    if let Some(pattern) = FORBIDDEN_PATTERNS.iter().find(|p| lowered.contains(**p)) {
        bail!("topic contains forbidden content: {pattern}");
    }
    Ok(topic.to_string())
}

/// Collapse runs of whitespace and cap the length. `None` for blank input.
pub fn sanitize_argument(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    Some(collapsed.chars().take(MAX_ARGUMENT_CHARS).collect())
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Argument(String),
    Status,
    History,
    Scores,
    Open,
    Quit,
    Help,
    Unknown(String),
}

impl Command {
    /// Parse a raw line. `None` when there is nothing to do.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if let Some(name) = trimmed.strip_prefix('/') {
            let name = name.split_whitespace().next().unwrap_or_default();
            return Some(match name.to_lowercase().as_str() {
                "status" => Self::Status,
                "history" => Self::History,
                "scores" => Self::Scores,
                "open" => Self::Open,
                "quit" | "exit" => Self::Quit,
                "help" => Self::Help,
                other => Self::Unknown(other.to_string()),
            });
        }
        sanitize_argument(trimmed).map(Self::Argument)
    }
}

pub const HELP: &str = "\
Type an argument and press enter. Commands:
  /status   agent status
  /history  rounds so far
  /scores   cumulative scores
  /open     AI opening argument
  /quit     end the debate";

/// Split plain text into paragraph documents.
pub fn paragraphs(text: &str, source: &str) -> Vec<Document> {
    let mut documents = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines().chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if !current.is_empty() {
                let index = documents.len();
                documents.push(
                    Document::new(current.join(" "))
                        .with_metadata("source", source)
                        .with_metadata("paragraph", index.to_string()),
                );
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    documents
}

/// Read an evidence file into paragraph documents.
pub fn load_evidence(path: &Path) -> Result<Vec<Document>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading evidence file {}", path.display()))?;
    Ok(paragraphs(&text, &path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_topic_length_bounds() {
        assert!(validate_topic("abcd").is_err());
        assert_eq!(validate_topic("  Nuclear power  ").unwrap(), "Nuclear power");
        assert!(validate_topic(&"x".repeat(MAX_TOPIC_CHARS)).is_ok());
        assert!(validate_topic(&"x".repeat(MAX_TOPIC_CHARS + 1)).is_err());
    }

    #[test]
    fn test_topic_rejects_markup() {
        for topic in [
            "Cats <SCRIPT>alert(1)</script>",
            "see javascript:void(0)",
            "<img onerror=x> dogs",
            "<a onclick=go()>birds</a>",
        ] {
            let err = validate_topic(topic).unwrap_err();
            assert!(err.to_string().contains("forbidden"), "{topic}");
        }
    }

    #[test]
    fn test_sanitize_collapses_and_truncates() {
        assert_eq!(
            sanitize_argument("  too   many\t\tspaces \n").as_deref(),
            Some("too many spaces")
        );
        assert_eq!(sanitize_argument(" \t\n"), None);
        let long = "a".repeat(MAX_ARGUMENT_CHARS + 50);
        assert_eq!(
            sanitize_argument(&long).unwrap().chars().count(),
            MAX_ARGUMENT_CHARS
        );
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/status"), Some(Command::Status));
        assert_eq!(Command::parse(" /QUIT "), Some(Command::Quit));
        assert_eq!(Command::parse("/exit"), Some(Command::Quit));
        assert_eq!(
            Command::parse("/dance now"),
            Some(Command::Unknown("dance".to_string()))
        );
        assert_eq!(Command::parse("   "), None);
        assert_eq!(
            Command::parse("Taxes  fund roads"),
            Some(Command::Argument("Taxes fund roads".to_string()))
        );
    }

    #[test]
    fn test_paragraph_split() {
        let docs = paragraphs("first line\ncontinues\n\n\nsecond\n  \nthird", "notes.txt");
        let contents: Vec<&str> = docs.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["first line continues", "second", "third"]);
        assert_eq!(docs[2].metadata["paragraph"], "2");
        assert_eq!(docs[0].metadata["source"], "notes.txt");
    }

    #[test]
    fn test_load_evidence_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Wind is cheap.\n\nSolar is cheaper.").unwrap();
        let docs = load_evidence(file.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(load_evidence(Path::new("/definitely/missing.txt")).is_err());
    }
}
