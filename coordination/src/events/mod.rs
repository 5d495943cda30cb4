//! Turn auditing over pub/sub.
//!
//! The coordinator publishes one event per stage of a turn. Subscribers
//! (loggers, transports, tests) receive them without slowing the turn down.
//!
//! ```text
//! turn_started ─▶ message_dispatched ×6 ─▶ turn_completed
//!                                       └─▶ turn_failed
//! ```

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventFilter, FilteredReceiver, SharedEventBus};
pub use types::DebateEvent;
