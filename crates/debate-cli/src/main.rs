//! Terminal transport for the debate coordinator.
//!
//! Reads one argument per line from stdin, runs it through a full turn and
//! prints the AI rebuttal with the round's scores.

mod input;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use debate_coordination::{
    DebateConfig, DebateCoordinator, DebateEvent, EventFilter, LlmService, Retriever, Transcript,
    TurnContext, TurnResult, VectorRetriever,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use input::Command;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file (environment variables still apply on top)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debate topic
    #[arg(long)]
    topic: String,

    /// Position the AI argues from
    #[arg(long)]
    stance: Option<String>,

    /// Debate id (defaults to a fresh UUID)
    #[arg(long)]
    debate_id: Option<String>,

    /// Plain-text evidence files, split into paragraphs
    #[arg(long, num_args = 1..)]
    evidence: Vec<PathBuf>,

    /// Write the transcript here on exit
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Print turn results as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = DebateConfig::load(args.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .init();

    let topic = input::validate_topic(&args.topic)?;
    let debate_id = args
        .debate_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let llm = Arc::new(LlmService::new(config.llm.clone())?);
    let retriever = Arc::new(VectorRetriever::new(llm.clone()));
    for path in &args.evidence {
        let documents = input::load_evidence(path)?;
        let added = retriever.add_documents(documents).await;
        info!(file = %path.display(), added, "Evidence indexed");
    }

    let coordinator = DebateCoordinator::new(llm.clone(), retriever, config.pipeline.clone());
    spawn_event_logger(&coordinator, &debate_id);

    info!(
        debate_id = %debate_id,
        provider = %llm.provider(),
        model = %config.llm.model,
        "Debate starting"
    );
    println!("Debate {debate_id}: {topic}");
    println!("{}", input::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        match command {
            Command::Argument(argument) => {
                let mut context = TurnContext::new(topic.as_str());
                if let Some(stance) = &args.stance {
                    context = context.with_stance(stance.as_str());
                }
                match coordinator
                    .process_debate_turn(&debate_id, &argument, context)
                    .await
                {
                    Ok(result) => print_turn(&result, args.json)?,
                    Err(e) => {
                        warn!(debate_id = %debate_id, error = %e, "Turn failed");
                        eprintln!("turn failed: {e}");
                    }
                }
            }
            Command::Open => {
                let stance = args.stance.as_deref();
                match coordinator.generate_argument(&topic, stance, Vec::new()).await {
                    Ok(response) => {
                        if args.json {
                            println!("{}", serde_json::to_string_pretty(&response)?);
                        } else {
                            println!("\nAI opening:\n{}\n", response.argument);
                        }
                    }
                    Err(e) => eprintln!("opening failed: {e}"),
                }
            }
            Command::Status => {
                let status = coordinator.get_all_agent_status();
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&status)?);
                } else {
                    for s in status.values() {
                        println!(
                            "{:<20} {:<10} {} messages",
                            s.agent_id, s.state, s.messages_processed
                        );
                    }
                }
            }
            Command::History => {
                for turn in coordinator.get_debate_history(&debate_id).await {
                    println!(
                        "Round {} [{}]\n  You: {}\n  AI:  {}",
                        turn.round_number,
                        turn.evaluation.round_winner,
                        turn.human_argument,
                        turn.ai_argument
                    );
                }
            }
            Command::Scores => {
                let scores = coordinator.calculate_cumulative_scores(&debate_id).await;
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&scores)?);
                } else {
                    println!(
                        "{} rounds | you {:.1} avg, {} wins | AI {:.1} avg, {} wins | {} ties",
                        scores.rounds,
                        scores.human_average,
                        scores.human_wins,
                        scores.ai_average,
                        scores.ai_wins,
                        scores.ties
                    );
                }
            }
            Command::Help => println!("{}", input::HELP),
            Command::Unknown(name) => eprintln!("unknown command: /{name}"),
            Command::Quit => break,
        }
    }

    let health = llm.health();
    info!(
        calls = health.calls,
        failures = health.failures,
        timeouts = health.timeouts,
        "Debate finished"
    );

    if let Some(path) = &args.transcript {
        let transcript = Transcript::new(
            &debate_id,
            &topic,
            coordinator.get_debate_history(&debate_id).await,
        );
        transcript
            .write_to(path)
            .with_context(|| format!("writing transcript to {}", path.display()))?;
        info!(path = %path.display(), rounds = transcript.turns.len(), "Transcript written");
    }

    Ok(())
}

/// Mirror this debate's events into the debug log.
fn spawn_event_logger(coordinator: &DebateCoordinator, debate_id: &str) {
    let mut events = coordinator
        .event_bus()
        .subscribe_filtered(EventFilter::new().debate(debate_id));
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match &event {
                DebateEvent::TurnFailed { round, error, .. } => {
                    debug!(round, error = %error, "turn_failed");
                }
                other => debug!(
                    event = other.event_type(),
                    correlation_id = other.correlation_id(),
                    "debate event"
                ),
            }
        }
    });
}

fn print_turn(result: &TurnResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    let eval = &result.evaluation;
    println!("\nRound {} AI:\n{}\n", result.round, result.ai_argument);
    println!(
        "Scores: you {:.1} | AI {:.1} | winner: {}",
        eval.human_scores.total(),
        eval.ai_scores.total(),
        eval.round_winner
    );
    if !eval.feedback.is_empty() {
        println!("Feedback: {}", eval.feedback);
    }
    println!("Keywords: {}\n", result.keywords.join(", "));
    Ok(())
}
