//! Prompt text for each agent role.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever wording changes, so a
//! transcript can be traced back to the prompts that produced it.

use std::fmt::Write;

use crate::text::preview;

/// Prompt version. Bump on any wording change.
pub const PROMPT_VERSION: &str = "1.2.0";

/// Placeholder when the retriever returned nothing.
pub const NO_EVIDENCE: &str = "No specific evidence available.";

/// Stance used when the caller supplied none.
pub const DEFAULT_STANCE: &str = "supporting";

/// Argument generator: topic, stance, key concepts and evidence excerpts.
pub fn argument_prompt(topic: &str, stance: &str, keywords: &[String], evidence: &[String]) -> String {
    let evidence_text = if evidence.is_empty() {
        NO_EVIDENCE.to_string()
    } else {
        evidence
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}. {}...", i + 1, e))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "\
You are arguing one side of a formal debate. Write a strong, well-reasoned argument.

Topic: {topic}
Stance: {stance}
Key concepts: {concepts}

Supporting material:
{evidence_text}

The argument should open with a clear thesis, reason step by step, use the \
supporting material where it helps, anticipate the obvious objection, and stay \
persuasive and coherent throughout.

Argument:",
        concepts = keywords.join(", "),
    )
}

/// Counter-argument phase one: list the opponent's weak points.
pub fn weakness_prompt(argument: &str) -> String {
    format!(
        "\
Identify two or three specific weaknesses in the argument below.

Argument: \"{argument}\"

Look for logical fallacies, unsupported claims, missing evidence, \
oversimplification and internal contradiction. Each weakness must be a \
concrete critique of this argument, not a generic remark, for example:
- \"Ignores the cost borne by rural households\"
- \"Cites a single small study as if it were settled consensus\"

Weaknesses, one per line:"
    )
}

/// Framing line that escalates with the round number.
pub fn round_instruction(round_number: u32) -> String {
    match round_number {
        0 | 1 => "This is the opening round. Open strong: lay out your central \
                  counter-argument on firm foundations."
            .to_string(),
        2 => "This is round 2. Address their rebuttal directly and reinforce your \
              position with a new angle or new evidence."
            .to_string(),
        n => format!(
            "This is round {n}. Synthesize the earlier exchanges, resolve the \
             contradictions still open between the two sides, and tighten your case."
        ),
    }
}

/// A single prior round reduced to its essentials.
pub struct RoundDigest<'a> {
    pub human_argument: &'a str,
    pub ai_argument: &'a str,
}

/// Compact recap of prior rounds, each argument cut to `preview_chars`.
pub fn history_digest(rounds: &[RoundDigest<'_>], preview_chars: usize) -> String {
    if rounds.is_empty() {
        return String::new();
    }
    let mut out = String::from("Previous rounds of this debate:\n");
    for (i, round) in rounds.iter().enumerate() {
        let _ = write!(
            out,
            "\nRound {}:\nHuman: {}...\nYou (AI): {}...\n",
            i + 1,
            preview(round.human_argument, preview_chars),
            preview(round.ai_argument, preview_chars),
        );
    }
    out
}

/// Counter-argument phase two.
pub fn counter_prompt(
    topic: &str,
    opponent_argument: &str,
    round_number: u32,
    history: &str,
    weaknesses: &[String],
) -> String {
    let weakness_text = if weaknesses.is_empty() {
        "- General logical gaps".to_string()
    } else {
        weaknesses
            .iter()
            .map(|w| format!("- {w}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "\
You are an expert debater in round {round_number} of a formal debate, arguing \
the OPPOSING side.

Topic: {topic}
{instruction}

{history}

Opponent's latest argument (round {round_number}):
\"{opponent_argument}\"

Weaknesses to exploit:
{weakness_text}

Rules:
1. Stay on the topic \"{topic}\".
2. Answer the opponent's specific points.
3. Take the opposite position and defend it with examples, studies or reasoning.
4. Do not drift into unrelated subjects.

Counter-argument:",
        instruction = round_instruction(round_number),
    )
}

/// System prompt paired with [`counter_prompt`].
pub fn counter_system_prompt(topic: &str, round_number: u32) -> String {
    format!(
        "You are a skilled debater in round {round_number} of a debate on '{topic}'. \
         Stay on this exact topic, build on earlier rounds, engage the opponent's \
         arguments directly and bring a fresh angle each round."
    )
}

/// Evaluator: ask for a bare 0–10 persuasiveness score.
pub fn persuasiveness_prompt(topic: &str, argument: &str) -> String {
    format!(
        "\
Rate how persuasive this argument is on a scale from 0 to 10.

Topic: {topic}
Argument: {argument}

Weigh emotional appeal, logical strength, use of examples and overall impact. \
Reply with the number only.

Score (0-10):"
    )
}

/// Evaluator: short comparative feedback.
pub fn feedback_prompt(human_argument: &str, human_total: f64, ai_argument: &str, ai_total: f64) -> String {
    format!(
        "\
Give brief, constructive feedback on the two debate arguments below.

Human argument:
{human_argument}
Score: {human_total:.1}/10

AI argument:
{ai_argument}
Score: {ai_total:.1}/10

In two or three sentences, name each side's strength and one thing to improve:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_prompt_without_evidence() {
        let p = argument_prompt("Nuclear power", "for", &["energy".to_string()], &[]);
        assert!(p.contains(NO_EVIDENCE));
        assert!(p.contains("Key concepts: energy"));
    }

    #[test]
    fn test_round_instruction_escalates() {
        assert!(round_instruction(1).contains("Open strong"));
        assert!(round_instruction(2).contains("rebuttal directly"));
        let third = round_instruction(3);
        assert!(third.contains("round 3"));
        assert!(third.contains("contradictions"));
        assert!(round_instruction(7).contains("round 7"));
    }

    #[test]
    fn test_history_digest_truncates() {
        let long = "x".repeat(500);
        let rounds = [RoundDigest {
            human_argument: &long,
            ai_argument: "short reply",
        }];
        let digest = history_digest(&rounds, 200);
        assert!(digest.contains("Round 1:"));
        assert!(digest.contains(&format!("Human: {}...", "x".repeat(200))));
        assert!(!digest.contains(&"x".repeat(201)));
        assert!(history_digest(&[], 200).is_empty());
    }
}
