//! Transitions and the per-state transition evaluator.

use std::fmt::{self, Display};
use std::hash::Hash;

use crate::{AiError, Guard, PriorityTable};

/// A single candidate edge out of a state.
///
/// Immutable once built and owned by exactly one [`StateTransitions`].
pub struct Transition<S, C> {
    next_state: S,
    priority: i32,
    guard: Guard<C>,
}

impl<S, C> Transition<S, C> {
    /// Creates a transition to `next_state`.
    pub fn new(next_state: S, priority: i32, guard: Guard<C>) -> Self {
        Self {
            next_state,
            priority,
            guard,
        }
    }

    /// The state this transition leads to.
    pub fn next_state(&self) -> &S {
        &self.next_state
    }

    /// Lower wins.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Runs the guard.
    pub fn is_valid(&self, ctx: &C) -> bool {
        self.guard.check(ctx)
    }
}

impl<S: fmt::Debug, C> fmt::Debug for Transition<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("next_state", &self.next_state)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// All outgoing transitions of one source state.
///
/// Built once at setup and read-only afterwards: [`evaluate`](Self::evaluate)
/// takes `&self`, so evaluating can never change which transitions exist or
/// their priorities.
pub struct StateTransitions<S, C> {
    source: S,
    transitions: Vec<Transition<S, C>>,
}

impl<S, C> StateTransitions<S, C>
where
    S: Clone + Eq + Hash + Display,
{
    /// Builds the evaluator for `source`.
    ///
    /// `targets` and `guards` are parallel lists: `guards[i]` gates the
    /// transition to `targets[i]`. Each priority is looked up in `table`
    /// under `(source, targets[i])`.
    ///
    /// # Errors
    /// - [`AiError::GuardCountMismatch`] if the lists differ in length
    /// - [`AiError::MissingPriority`] if `table` lacks a pair
    pub fn build(
        source: S,
        targets: Vec<S>,
        guards: Vec<Guard<C>>,
        table: &PriorityTable<S>,
    ) -> Result<Self, AiError> {
        if targets.len() != guards.len() {
            return Err(AiError::GuardCountMismatch {
                targets: targets.len(),
                guards: guards.len(),
            });
        }

        let transitions = targets
            .into_iter()
            .zip(guards)
            .map(|(target, guard)| {
                let priority = table.priority(&source, &target)?;
                Ok(Transition::new(target, priority, guard))
            })
            .collect::<Result<Vec<_>, AiError>>()?;

        tracing::debug!(
            source = %source,
            transitions = transitions.len(),
            "transition set built"
        );

        Ok(Self {
            source,
            transitions,
        })
    }
}

impl<S, C> StateTransitions<S, C> {
    /// Builds an evaluator from already-prioritized transitions.
    pub fn from_transitions(source: S, transitions: Vec<Transition<S, C>>) -> Self {
        Self {
            source,
            transitions,
        }
    }

    /// Decides the next state for this tick.
    ///
    /// Every guard is called exactly once, in declaration order, whatever
    /// the outcome. Among the transitions whose guard held:
    ///
    /// - none: `None`, the agent keeps its current state
    /// - one: its target
    /// - several: the target with the lowest priority number; on a tie the
    ///   transition declared first wins
    pub fn evaluate(&self, ctx: &C) -> Option<&S> {
        // Collect first so no guard is skipped by short-circuiting.
        let valid: Vec<&Transition<S, C>> =
            self.transitions.iter().filter(|t| t.is_valid(ctx)).collect();

        // `min_by_key` keeps the first of equal minimums.
        valid
            .into_iter()
            .min_by_key(|t| t.priority)
            .map(|t| &t.next_state)
    }

    /// The state these transitions leave from.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Transitions in declaration order.
    pub fn transitions(&self) -> &[Transition<S, C>] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

impl<S: fmt::Debug, C> fmt::Debug for StateTransitions<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateTransitions")
            .field("source", &self.source)
            .field("transitions", &self.transitions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BehaviorKind::{self, Attack, Idle, PowerUp};

    fn guards(flags: [bool; 3]) -> Vec<Guard<()>> {
        flags
            .into_iter()
            .map(|flag| Guard::new(move |_: &()| flag))
            .collect()
    }

    fn idle_transitions(flags: [bool; 3]) -> StateTransitions<BehaviorKind, ()> {
        StateTransitions::build(
            Idle,
            vec![Idle, Attack, PowerUp],
            guards(flags),
            &PriorityTable::standard(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_assigns_priorities_from_table() {
        let evaluator = idle_transitions([false; 3]);
        let priorities: Vec<i32> =
            evaluator.transitions().iter().map(|t| t.priority()).collect();
        assert_eq!(priorities, vec![10, 1, 3]);
        assert_eq!(evaluator.source(), &Idle);
    }

    #[test]
    fn test_build_guard_count_mismatch() {
        let result = StateTransitions::build(
            Idle,
            vec![Idle, Attack],
            guards([true, true, true]),
            &PriorityTable::standard(),
        );
        assert!(matches!(
            result,
            Err(AiError::GuardCountMismatch { targets: 2, guards: 3 })
        ));
    }

    #[test]
    fn test_build_missing_priority() {
        let mut table = PriorityTable::new();
        table.insert(Idle, Idle, 1);
        let result = StateTransitions::build(
            Idle,
            vec![Idle, Attack],
            guards([true, true, true]).into_iter().take(2).collect(),
            &table,
        );
        assert!(matches!(result, Err(AiError::MissingPriority { .. })));
    }

    #[test]
    fn test_evaluate_no_valid_guard_returns_none() {
        assert_eq!(idle_transitions([false, false, false]).evaluate(&()), None);
    }

    #[test]
    fn test_evaluate_single_valid_guard_returns_its_target() {
        assert_eq!(
            idle_transitions([false, false, true]).evaluate(&()),
            Some(&PowerUp)
        );
        assert_eq!(
            idle_transitions([true, false, false]).evaluate(&()),
            Some(&Idle)
        );
    }

    #[test]
    fn test_evaluate_multiple_valid_picks_lowest_priority() {
        // Idle -> Attack is priority 1, Idle -> PowerUp is 3.
        assert_eq!(
            idle_transitions([true, true, true]).evaluate(&()),
            Some(&Attack)
        );
        assert_eq!(
            idle_transitions([true, false, true]).evaluate(&()),
            Some(&PowerUp)
        );
    }

    #[test]
    fn test_evaluate_tie_first_declared_wins() {
        let evaluator = StateTransitions::from_transitions(
            Idle,
            vec![
                Transition::new(Idle, 9, Guard::always()),
                Transition::new(PowerUp, 2, Guard::always()),
                Transition::new(Attack, 2, Guard::always()),
            ],
        );
        assert_eq!(evaluator.evaluate(&()), Some(&PowerUp));
    }

    #[test]
    fn test_evaluate_is_repeatable() {
        let evaluator = idle_transitions([true, true, false]);
        let first = evaluator.evaluate(&()).copied();
        let second = evaluator.evaluate(&()).copied();
        assert_eq!(first, second);
        assert_eq!(evaluator.len(), 3);
    }
}
