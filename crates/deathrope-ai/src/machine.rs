//! An agent's behavior state machine.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use crate::{AiError, StateTransitions};

/// One [`StateTransitions`] per source state plus the agent's current state.
///
/// Call [`tick`](Self::tick) once per simulation tick. The machine asks the
/// evaluator of the current state for a decision and moves there.
pub struct BehaviorMachine<S, C> {
    current: S,
    evaluators: HashMap<S, StateTransitions<S, C>>,
}

impl<S, C> BehaviorMachine<S, C>
where
    S: Clone + Eq + Hash + Display,
{
    /// Creates a machine sitting in `initial` with no transitions yet.
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            evaluators: HashMap::new(),
        }
    }

    /// Registers the transition set of its source state.
    ///
    /// # Errors
    /// [`AiError::DuplicateSource`] if that state already has one.
    pub fn insert(&mut self, transitions: StateTransitions<S, C>) -> Result<(), AiError> {
        let source = transitions.source().clone();
        if self.evaluators.contains_key(&source) {
            return Err(AiError::DuplicateSource(source.to_string()));
        }
        self.evaluators.insert(source, transitions);
        Ok(())
    }

    /// Evaluates the current state's transitions.
    ///
    /// Returns the new state if the agent changed state. A decision to
    /// stay in the current state, no valid transition, or a state without
    /// a transition set all return `None`.
    pub fn tick(&mut self, ctx: &C) -> Option<S> {
        let next = self.evaluators.get(&self.current)?.evaluate(ctx)?;
        if *next == self.current {
            return None;
        }

        let next = next.clone();
        tracing::trace!(from = %self.current, to = %next, "behavior transition");
        self.current = next.clone();
        Some(next)
    }

    /// The state the agent is in.
    pub fn current(&self) -> &S {
        &self.current
    }

    /// Forces the agent into `state`, e.g. when it respawns.
    pub fn reset(&mut self, state: S) {
        self.current = state;
    }

    /// Returns `true` if `state` has a transition set.
    pub fn has_transitions(&self, state: &S) -> bool {
        self.evaluators.contains_key(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BehaviorKind::{self, Attack, Idle, PowerUp};
    use crate::{Guard, PriorityTable};

    struct View {
        enemy_near: bool,
        power_up_near: bool,
    }

    fn machine() -> BehaviorMachine<BehaviorKind, View> {
        let table = PriorityTable::standard();
        let mut machine = BehaviorMachine::new(Idle);
        for source in BehaviorKind::ALL {
            let transitions = StateTransitions::build(
                source,
                vec![Idle, Attack, PowerUp],
                vec![
                    Guard::new(|v: &View| !v.enemy_near && !v.power_up_near),
                    Guard::new(|v: &View| v.enemy_near),
                    Guard::new(|v: &View| v.power_up_near),
                ],
                &table,
            )
            .unwrap();
            machine.insert(transitions).unwrap();
        }
        machine
    }

    #[test]
    fn test_tick_moves_to_decided_state() {
        let mut m = machine();
        let view = View { enemy_near: true, power_up_near: false };
        assert_eq!(m.tick(&view), Some(Attack));
        assert_eq!(m.current(), &Attack);
    }

    #[test]
    fn test_tick_staying_in_place_returns_none() {
        let mut m = machine();
        let view = View { enemy_near: true, power_up_near: false };
        m.tick(&view);
        assert_eq!(m.tick(&view), None);
        assert_eq!(m.current(), &Attack);
    }

    #[test]
    fn test_tick_uses_current_state_priorities() {
        let mut m = machine();
        let both = View { enemy_near: true, power_up_near: true };

        // From Idle, Attack (1) beats PowerUp (3).
        assert_eq!(m.tick(&both), Some(Attack));
        // From Attack, PowerUp (3) beats Attack (5).
        assert_eq!(m.tick(&both), Some(PowerUp));
        // From PowerUp, Attack (3) beats PowerUp (5).
        assert_eq!(m.tick(&both), Some(Attack));
    }

    #[test]
    fn test_insert_duplicate_source_rejected() {
        let mut m = machine();
        let again = StateTransitions::build(
            Idle,
            vec![],
            vec![],
            &PriorityTable::standard(),
        )
        .unwrap();
        assert!(matches!(m.insert(again), Err(AiError::DuplicateSource(s)) if s == "Idle"));
    }

    #[test]
    fn test_tick_without_transition_set_returns_none() {
        let mut m: BehaviorMachine<BehaviorKind, View> = BehaviorMachine::new(PowerUp);
        let view = View { enemy_near: true, power_up_near: false };
        assert_eq!(m.tick(&view), None);
        assert!(!m.has_transitions(&PowerUp));
    }
}
