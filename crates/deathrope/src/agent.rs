//! AI agents: the standard behavior brain and the per-player agent record.

use deathrope_ai::{AiError, BehaviorKind, BehaviorMachine, Guard, PriorityTable, StateTransitions};
use deathrope_protocol::PlayerId;

use BehaviorKind::{Attack, Idle, PowerUp};

/// What an agent currently perceives. Filled in by the game each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentView {
    /// An enemy is close enough to engage.
    pub enemy_in_range: bool,
    /// A power-up is lying close by.
    pub power_up_nearby: bool,
    /// The agent already carries a power-up.
    pub holding_power_up: bool,
}

impl AgentView {
    fn wants_power_up(&self) -> bool {
        self.power_up_nearby && !self.holding_power_up
    }
}

/// The stock Idle/Attack/PowerUp brain using [`PriorityTable::standard`].
pub fn standard_brain() -> Result<BehaviorMachine<BehaviorKind, AgentView>, AiError> {
    brain_with_table(&PriorityTable::standard())
}

/// The stock brain with custom priorities.
///
/// # Errors
/// [`AiError::MissingPriority`] if `table` does not cover every pair of
/// behavior states.
pub fn brain_with_table(
    table: &PriorityTable<BehaviorKind>,
) -> Result<BehaviorMachine<BehaviorKind, AgentView>, AiError> {
    table.validate(&BehaviorKind::ALL)?;

    let mut brain = BehaviorMachine::new(Idle);
    brain.insert(StateTransitions::build(
        Idle,
        vec![Idle, Attack, PowerUp],
        vec![
            Guard::always(),
            Guard::new(|v: &AgentView| v.enemy_in_range),
            Guard::new(AgentView::wants_power_up),
        ],
        table,
    )?)?;
    brain.insert(StateTransitions::build(
        Attack,
        vec![Idle, Attack, PowerUp],
        vec![
            Guard::new(|v: &AgentView| !v.enemy_in_range),
            Guard::new(|v: &AgentView| v.enemy_in_range),
            Guard::new(AgentView::wants_power_up),
        ],
        table,
    )?)?;
    brain.insert(StateTransitions::build(
        PowerUp,
        vec![Idle, Attack, PowerUp],
        vec![
            Guard::new(|v: &AgentView| !v.enemy_in_range && !v.wants_power_up()),
            Guard::new(|v: &AgentView| v.enemy_in_range && !v.wants_power_up()),
            Guard::new(AgentView::wants_power_up),
        ],
        table,
    )?)?;
    Ok(brain)
}

/// One AI-controlled player.
pub struct Agent {
    player: PlayerId,
    brain: BehaviorMachine<BehaviorKind, AgentView>,
    view: AgentView,
}

impl Agent {
    pub fn new(player: PlayerId, brain: BehaviorMachine<BehaviorKind, AgentView>) -> Self {
        Self {
            player,
            brain,
            view: AgentView::default(),
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn behavior(&self) -> BehaviorKind {
        *self.brain.current()
    }

    pub fn set_view(&mut self, view: AgentView) {
        self.view = view;
    }

    /// Runs the brain against the latest view. Returns the new behavior if
    /// it changed.
    pub fn tick(&mut self) -> Option<BehaviorKind> {
        let changed = self.brain.tick(&self.view);
        if let Some(behavior) = changed {
            tracing::debug!(player = %self.player, %behavior, "agent behavior changed");
        }
        changed
    }

    /// Back to Idle, e.g. when a new round starts.
    pub fn reset(&mut self) {
        self.brain.reset(Idle);
        self.view = AgentView::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(enemy: bool, nearby: bool, holding: bool) -> AgentView {
        AgentView {
            enemy_in_range: enemy,
            power_up_nearby: nearby,
            holding_power_up: holding,
        }
    }

    fn agent_in(state: BehaviorKind) -> Agent {
        let mut brain = standard_brain().unwrap();
        brain.reset(state);
        Agent::new(PlayerId(1), brain)
    }

    #[test]
    fn test_idle_with_nothing_around_stays_idle() {
        let mut agent = agent_in(Idle);
        assert_eq!(agent.tick(), None);
        assert_eq!(agent.behavior(), Idle);
    }

    #[test]
    fn test_idle_prefers_attack_over_power_up() {
        let mut agent = agent_in(Idle);
        agent.set_view(view(true, true, false));
        assert_eq!(agent.tick(), Some(Attack));
    }

    #[test]
    fn test_attack_breaks_off_for_power_up() {
        let mut agent = agent_in(Attack);
        agent.set_view(view(true, true, false));
        assert_eq!(agent.tick(), Some(PowerUp));
    }

    #[test]
    fn test_attack_returns_to_idle_without_enemy() {
        let mut agent = agent_in(Attack);
        assert_eq!(agent.tick(), Some(Idle));
    }

    #[test]
    fn test_power_up_collected_then_attacks() {
        let mut agent = agent_in(PowerUp);
        agent.set_view(view(true, true, true));
        assert_eq!(agent.tick(), Some(Attack));
    }

    #[test]
    fn test_power_up_keeps_going_while_not_holding() {
        let mut agent = agent_in(PowerUp);
        agent.set_view(view(true, true, false));
        assert_eq!(agent.tick(), None);
        assert_eq!(agent.behavior(), PowerUp);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut agent = agent_in(Attack);
        agent.set_view(view(true, false, false));
        agent.reset();
        assert_eq!(agent.behavior(), Idle);
        assert_eq!(agent.tick(), None);
    }

    #[test]
    fn test_brain_with_incomplete_table_fails() {
        let mut table = PriorityTable::new();
        table.insert(Idle, Attack, 1);
        assert!(matches!(
            brain_with_table(&table),
            Err(AiError::MissingPriority { .. })
        ));
    }
}
