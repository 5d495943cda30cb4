//! Debate transcripts: JSON export of a debate's recorded turns.
//!
//! The in-memory history only lives as long as the process. A transcript
//! mirrors the [`DebateTurn`] shape so an external store can keep it.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::DebateTurn;
use crate::prompts::PROMPT_VERSION;
use crate::scoring::CumulativeScores;

/// A debate's turns, ready for external storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Schema version for forward compatibility.
    pub version: u32,
    /// Prompt wording the turns were generated with. Empty when unknown.
    #[serde(default)]
    pub prompt_version: String,
    pub debate_id: String,
    pub topic: String,
    pub exported_at: DateTime<Utc>,
    pub turns: Vec<DebateTurn>,
}

impl Transcript {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(debate_id: &str, topic: &str, turns: Vec<DebateTurn>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            prompt_version: PROMPT_VERSION.to_string(),
            debate_id: debate_id.to_string(),
            topic: topic.to_string(),
            exported_at: Utc::now(),
            turns,
        }
    }

    /// Totals recomputed from the recorded evaluations.
    pub fn cumulative_scores(&self) -> CumulativeScores {
        CumulativeScores::from_rounds(self.turns.iter().map(|t| {
            (
                &t.evaluation.human_scores,
                &t.evaluation.ai_scores,
                t.evaluation.round_winner,
            )
        }))
    }

    pub fn to_json(&self) -> Result<String, TranscriptError> {
        serde_json::to_string_pretty(self).map_err(|e| TranscriptError::SerializeFailed {
            reason: e.to_string(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, TranscriptError> {
        let transcript: Self =
            serde_json::from_str(json).map_err(|e| TranscriptError::DeserializeFailed {
                reason: e.to_string(),
            })?;

        if transcript.version > Self::CURRENT_VERSION {
            return Err(TranscriptError::VersionMismatch {
                expected: Self::CURRENT_VERSION,
                found: transcript.version,
            });
        }

        // Rounds must read 1, 2, 3, ... in order.
        for (i, turn) in transcript.turns.iter().enumerate() {
            let expected = i as u32 + 1;
            if turn.round_number != expected {
                return Err(TranscriptError::RoundGap {
                    expected,
                    found: turn.round_number,
                });
            }
        }

        Ok(transcript)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), TranscriptError> {
        std::fs::write(path, self.to_json()?).map_err(|e| TranscriptError::Io {
            reason: format!("{}: {}", path.display(), e),
        })
    }

    pub fn read_from(path: &Path) -> Result<Self, TranscriptError> {
        let raw = std::fs::read_to_string(path).map_err(|e| TranscriptError::Io {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json(&raw)
    }
}

/// Error during transcript export or import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    SerializeFailed { reason: String },
    DeserializeFailed { reason: String },
    /// Written by a newer schema.
    VersionMismatch { expected: u32, found: u32 },
    /// Turns are missing or out of order.
    RoundGap { expected: u32, found: u32 },
    Io { reason: String },
}

impl std::fmt::Display for TranscriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SerializeFailed { reason } => write!(f, "serialize failed: {}", reason),
            Self::DeserializeFailed { reason } => write!(f, "deserialize failed: {}", reason),
            Self::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Self::RoundGap { expected, found } => {
                write!(f, "round gap: expected round {}, found {}", expected, found)
            }
            Self::Io { reason } => write!(f, "transcript io failed: {}", reason),
        }
    }
}

impl std::error::Error for TranscriptError {}
