//! Debate coordination: turn pipeline, history and transcripts.
//!
//! # Turn Flow
//!
//! ```text
//! process_debate_turn(id, argument, ctx)
//!   │
//!   ├─ lock debate `id`, take next round n
//!   ├─ keywords ─▶ counter-argument (history of rounds 1..n-1) ─▶ evaluation
//!   ├─ ok  → append DebateTurn n, advance counter
//!   └─ err → report, history untouched
//! ```

pub mod coordinator;
pub mod state;
pub mod transcript;

pub use coordinator::{
    CoordinatorError, CoordinatorResult, DebateCoordinator, SharedDebateCoordinator,
};
pub use state::{DebateContext, DebateTurn, TurnContext, TurnResult};
pub use transcript::{Transcript, TranscriptError};
