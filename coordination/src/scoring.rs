//! Score structures shared by the evaluator and the coordinator.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Minimum gap between totals before a round stops being a tie.
pub const DEADBAND: f64 = 0.5;

/// Upper bound of every criterion.
pub const MAX_SCORE: f64 = 10.0;

/// Five fixed criteria, each in `[0, 10]`.
///
/// `total` is derived on every read and included when serialised; it is
/// never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct ScoreCard {
    pub logical_coherence: f64,
    pub evidence_quality: f64,
    pub persuasiveness: f64,
    pub clarity: f64,
    pub relevance: f64,
}

impl ScoreCard {
    pub const CRITERIA: [&'static str; 5] = [
        "logical_coherence",
        "evidence_quality",
        "persuasiveness",
        "clarity",
        "relevance",
    ];

    /// Build a card, clamping every criterion into `[0, 10]`.
    pub fn new(
        logical_coherence: f64,
        evidence_quality: f64,
        persuasiveness: f64,
        clarity: f64,
        relevance: f64,
    ) -> Self {
        Self {
            logical_coherence: clamp_score(logical_coherence),
            evidence_quality: clamp_score(evidence_quality),
            persuasiveness: clamp_score(persuasiveness),
            clarity: clamp_score(clarity),
            relevance: clamp_score(relevance),
        }
    }

    /// Criterion values in [`Self::CRITERIA`] order.
    pub fn values(&self) -> [f64; 5] {
        [
            self.logical_coherence,
            self.evidence_quality,
            self.persuasiveness,
            self.clarity,
            self.relevance,
        ]
    }

    /// Unweighted mean of the five criteria.
    pub fn total(&self) -> f64 {
        self.values().iter().sum::<f64>() / self.values().len() as f64
    }
}

impl Serialize for ScoreCard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ScoreCard", 6)?;
        s.serialize_field("logical_coherence", &self.logical_coherence)?;
        s.serialize_field("evidence_quality", &self.evidence_quality)?;
        s.serialize_field("persuasiveness", &self.persuasiveness)?;
        s.serialize_field("clarity", &self.clarity)?;
        s.serialize_field("relevance", &self.relevance)?;
        s.serialize_field("total", &self.total())?;
        s.end()
    }
}

/// Clamp into `[0, 10]`; non-finite values collapse to 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, MAX_SCORE)
    } else {
        0.0
    }
}

/// Outcome of one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundWinner {
    Human,
    Ai,
    #[default]
    Tie,
}

impl RoundWinner {
    /// Compare totals with a [`DEADBAND`] margin.
    pub fn decide(human_total: f64, ai_total: f64) -> Self {
        if human_total > ai_total + DEADBAND {
            Self::Human
        } else if ai_total > human_total + DEADBAND {
            Self::Ai
        } else {
            Self::Tie
        }
    }
}

impl std::fmt::Display for RoundWinner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Ai => write!(f, "ai"),
            Self::Tie => write!(f, "tie"),
        }
    }
}

/// Running totals for one debate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CumulativeScores {
    pub human_total: f64,
    pub ai_total: f64,
    pub rounds: usize,
    pub human_average: f64,
    pub ai_average: f64,
    pub human_wins: usize,
    pub ai_wins: usize,
    pub ties: usize,
}

impl CumulativeScores {
    /// Fold per-round `(human, ai, winner)` results.
    pub fn from_rounds<'a, I>(rounds: I) -> Self
    where
        I: IntoIterator<Item = (&'a ScoreCard, &'a ScoreCard, RoundWinner)>,
    {
        let mut acc = Self::default();
        for (human, ai, winner) in rounds {
            acc.human_total += human.total();
            acc.ai_total += ai.total();
            acc.rounds += 1;
            match winner {
                RoundWinner::Human => acc.human_wins += 1,
                RoundWinner::Ai => acc.ai_wins += 1,
                RoundWinner::Tie => acc.ties += 1,
            }
        }
        if acc.rounds > 0 {
            acc.human_average = acc.human_total / acc.rounds as f64;
            acc.ai_average = acc.ai_total / acc.rounds as f64;
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(v: f64) -> ScoreCard {
        ScoreCard::new(v, v, v, v, v)
    }

    #[test]
    fn test_total_is_mean_of_criteria() {
        let card = ScoreCard::new(6.0, 4.0, 5.0, 8.0, 7.0);
        assert!((card.total() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_new_clamps() {
        let card = ScoreCard::new(12.0, -1.0, f64::NAN, 10.0, 0.0);
        assert_eq!(card.values(), [10.0, 0.0, 0.0, 10.0, 0.0]);
    }

    #[test]
    fn test_serialized_total_tracks_criteria() {
        let mut card = uniform(4.0);
        card.clarity = 9.0;
        let json = serde_json::to_value(card).unwrap();
        assert!((json["total"].as_f64().unwrap() - 5.0).abs() < 1e-9);

        let back: ScoreCard = serde_json::from_value(json).unwrap();
        assert_eq!(back, card);
    }

    #[test]
    fn test_winner_deadband() {
        assert_eq!(RoundWinner::decide(7.6, 7.0), RoundWinner::Human);
        assert_eq!(RoundWinner::decide(5.0, 8.0), RoundWinner::Ai);
        assert_eq!(RoundWinner::decide(7.2, 6.5), RoundWinner::Human);
        assert_eq!(RoundWinner::decide(7.2, 6.8), RoundWinner::Tie);
        assert_eq!(RoundWinner::decide(6.5, 7.0), RoundWinner::Tie);
        assert_eq!(RoundWinner::decide(5.0, 5.0), RoundWinner::Tie);
    }

    #[test]
    fn test_cumulative_empty_has_zero_averages() {
        let scores = CumulativeScores::from_rounds(std::iter::empty());
        assert_eq!(scores.rounds, 0);
        assert_eq!(scores.human_average, 0.0);
        assert_eq!(scores.ai_average, 0.0);
    }

    #[test]
    fn test_cumulative_sums_and_counts() {
        let (h1, a1) = (uniform(8.0), uniform(6.0));
        let (h2, a2) = (uniform(5.0), uniform(5.0));
        let scores = CumulativeScores::from_rounds(vec![
            (&h1, &a1, RoundWinner::Human),
            (&h2, &a2, RoundWinner::Tie),
        ]);
        assert_eq!(scores.rounds, 2);
        assert!((scores.human_total - 13.0).abs() < 1e-9);
        assert!((scores.ai_average - 5.5).abs() < 1e-9);
        assert_eq!((scores.human_wins, scores.ai_wins, scores.ties), (1, 0, 1));
    }
}
