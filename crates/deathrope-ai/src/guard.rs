//! Guard predicates gating transitions.

use std::fmt;

/// A boolean predicate over the agent's view of the world.
///
/// Guards are called once per evaluation and may be called again on the
/// next tick with the same context, so they must not have side effects
/// that change their own answer. A guard that panics is a bug in the
/// agent setup; the panic is not caught.
///
/// ```rust
/// use deathrope_ai::Guard;
///
/// struct View {
///     enemy_distance: f32,
/// }
///
/// let in_range = Guard::new(|v: &View| v.enemy_distance < 4.0);
/// assert!(in_range.check(&View { enemy_distance: 2.5 }));
/// assert!(!in_range.check(&View { enemy_distance: 9.0 }));
/// ```
pub struct Guard<C> {
    predicate: Box<dyn Fn(&C) -> bool + Send + Sync>,
}

impl<C> Guard<C> {
    /// Wraps a predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
        }
    }

    /// A guard that is always satisfied.
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// A guard that is never satisfied. Useful for transitions that are
    /// declared for completeness but disabled for now.
    pub fn never() -> Self {
        Self::new(|_| false)
    }

    /// Runs the predicate.
    pub fn check(&self, ctx: &C) -> bool {
        (self.predicate)(ctx)
    }
}

impl<C> fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_and_never() {
        assert!(Guard::<()>::always().check(&()));
        assert!(!Guard::<()>::never().check(&()));
    }

    #[test]
    fn test_check_reads_context() {
        let guard = Guard::new(|health: &u32| *health < 25);
        assert!(guard.check(&10));
        assert!(!guard.check(&80));
    }
}
