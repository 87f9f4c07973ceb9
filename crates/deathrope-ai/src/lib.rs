//! AI decision layer for Deathrope.
//!
//! An agent is a finite state machine over behavior states. For every
//! source state there is one [`StateTransitions`] evaluator holding the
//! candidate edges out of it. Each edge is a [`Transition`]: a target
//! state, a [`Guard`] predicate, and a priority taken from a
//! [`PriorityTable`].
//!
//! Every tick the evaluator runs all guards once and picks the valid
//! transition with the lowest priority number. It only decides; moving,
//! attacking and picking up power-ups is the agent executor's job.
//!
//! # Key types
//!
//! - [`BehaviorKind`]: the built-in behavior states (Idle, Attack, PowerUp)
//! - [`PriorityTable`]: `(from, to) -> priority`, validated for completeness
//! - [`StateTransitions`]: the per-state evaluator
//! - [`BehaviorMachine`]: one evaluator per state plus the current state

mod behavior;
mod error;
mod guard;
mod machine;
mod priority;
mod transition;

pub use behavior::BehaviorKind;
pub use error::AiError;
pub use guard::Guard;
pub use machine::BehaviorMachine;
pub use priority::{PriorityEntry, PriorityTable};
pub use transition::{StateTransitions, Transition};
