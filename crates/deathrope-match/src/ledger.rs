//! The team ledger: per-team identity, score, and alive status.

use deathrope_protocol::{Color, Position, TeamId, TeamInfo, TeamScore};

use crate::MatchError;

/// Every team fields exactly two players.
pub const PLAYERS_PER_TEAM: usize = 2;

/// Primary/secondary color pairs handed out by team index.
const TEAM_PALETTE: [[Color; 2]; 4] = [
    [Color::rgb(255, 0, 0), Color::rgb(255, 50, 0)],    // red, orange
    [Color::rgb(0, 0, 255), Color::rgb(0, 150, 255)],   // blue, cyan
    [Color::rgb(0, 160, 0), Color::rgb(120, 255, 0)],   // green, lime
    [Color::rgb(255, 220, 0), Color::rgb(255, 170, 0)], // yellow, gold
];

/// Color pair for the team at `index`. Wraps around past four teams.
pub fn team_colors(index: usize) -> [Color; 2] {
    TEAM_PALETTE[index % TEAM_PALETTE.len()]
}

/// One team's record.
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub score: u32,
    pub alive: bool,
    pub spawn_points: [Position; 2],
    pub colors: [Color; 2],
    pub layer: u32,
}

impl Team {
    /// Creates a team with zero score, alive, named `"Team <index>"`.
    pub fn new(id: TeamId, spawn_points: [Position; 2], colors: [Color; 2], layer: u32) -> Self {
        Self {
            id,
            name: format!("Team {}", id.0),
            score: 0,
            alive: true,
            spawn_points,
            colors,
            layer,
        }
    }

    /// The replicated identity of this team.
    pub fn info(&self) -> TeamInfo {
        TeamInfo {
            id: self.id,
            name: self.name.clone(),
            layer: self.layer,
            colors: self.colors,
            spawn_points: self.spawn_points,
        }
    }
}

/// Fixed number of team slots, filled as teams are spawned.
///
/// Slots are allocated when the team count is known and stay put for the
/// whole match, so a `TeamId` is also the slot index.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    slots: Vec<Option<Team>>,
}

impl Ledger {
    /// Allocates `count` empty team slots.
    pub fn with_slots(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    /// Number of allocated slots (spawned or not).
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Puts a team into its slot, replacing whatever was there.
    ///
    /// # Errors
    /// [`MatchError::TeamSlotOutOfRange`] if the id has no slot.
    pub fn insert(&mut self, team: Team) -> Result<Option<Team>, MatchError> {
        let slots = self.slots.len();
        let slot = self
            .slots
            .get_mut(team.id.index())
            .ok_or(MatchError::TeamSlotOutOfRange { team: team.id, slots })?;
        Ok(slot.replace(team))
    }

    pub fn get(&self, id: TeamId) -> Option<&Team> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: TeamId) -> Option<&mut Team> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Spawned teams in slot order.
    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.slots.iter().flatten()
    }

    /// Number of spawned teams.
    pub fn len(&self) -> usize {
        self.teams().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds one point to `id` and returns the new score.
    ///
    /// # Errors
    /// [`MatchError::UnknownTeam`] if no such team was spawned.
    pub fn add_score(&mut self, id: TeamId) -> Result<u32, MatchError> {
        let team = self.get_mut(id).ok_or(MatchError::UnknownTeam(id))?;
        team.score += 1;
        Ok(team.score)
    }

    /// Marks a team as wiped out for the rest of the round.
    pub fn mark_eliminated(&mut self, id: TeamId) -> Result<(), MatchError> {
        let team = self.get_mut(id).ok_or(MatchError::UnknownTeam(id))?;
        team.alive = false;
        Ok(())
    }

    /// Brings every team back for a new round.
    pub fn revive_all(&mut self) {
        for team in self.slots.iter_mut().flatten() {
            team.alive = true;
        }
    }

    /// Ids of spawned teams other than `excluded`.
    pub fn others(&self, excluded: TeamId) -> Vec<TeamId> {
        self.teams()
            .filter(|t| t.id != excluded)
            .map(|t| t.id)
            .collect()
    }

    /// The scoreboard in slot order.
    pub fn scores(&self) -> Vec<TeamScore> {
        self.teams()
            .map(|t| TeamScore {
                team: t.id,
                name: t.name.clone(),
                score: t.score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(index: u32) -> Team {
        Team::new(
            TeamId(index),
            [Position::default(); 2],
            team_colors(index as usize),
            8 + index,
        )
    }

    fn ledger(count: u32) -> Ledger {
        let mut ledger = Ledger::with_slots(count as usize);
        for i in 0..count {
            ledger.insert(team(i)).unwrap();
        }
        ledger
    }

    #[test]
    fn test_new_team_is_named_by_index() {
        let t = team(2);
        assert_eq!(t.name, "Team 2");
        assert_eq!(t.score, 0);
        assert!(t.alive);
    }

    #[test]
    fn test_team_colors_first_two_are_red_and_blue() {
        assert_eq!(team_colors(0)[0], Color::rgb(255, 0, 0));
        assert_eq!(team_colors(1)[0], Color::rgb(0, 0, 255));
        assert_eq!(team_colors(4), team_colors(0));
    }

    #[test]
    fn test_insert_out_of_range_slot() {
        let mut ledger = Ledger::with_slots(2);
        let result = ledger.insert(team(2));
        assert!(matches!(
            result,
            Err(MatchError::TeamSlotOutOfRange { slots: 2, .. })
        ));
    }

    #[test]
    fn test_add_score_increments_only_that_team() {
        let mut ledger = ledger(3);
        assert_eq!(ledger.add_score(TeamId(2)).unwrap(), 1);
        assert_eq!(ledger.get(TeamId(0)).unwrap().score, 0);
        assert_eq!(ledger.get(TeamId(1)).unwrap().score, 0);
        assert_eq!(ledger.get(TeamId(2)).unwrap().score, 1);
    }

    #[test]
    fn test_add_score_unknown_team() {
        let mut ledger = Ledger::with_slots(2);
        ledger.insert(team(0)).unwrap();
        assert!(matches!(
            ledger.add_score(TeamId(1)),
            Err(MatchError::UnknownTeam(TeamId(1)))
        ));
    }

    #[test]
    fn test_len_counts_only_spawned_teams() {
        let mut ledger = Ledger::with_slots(4);
        ledger.insert(team(1)).unwrap();
        assert_eq!(ledger.slot_count(), 4);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_others_excludes_given_team() {
        let ledger = ledger(3);
        assert_eq!(ledger.others(TeamId(1)), vec![TeamId(0), TeamId(2)]);
    }

    #[test]
    fn test_eliminate_then_revive() {
        let mut ledger = ledger(2);
        ledger.mark_eliminated(TeamId(0)).unwrap();
        assert!(!ledger.get(TeamId(0)).unwrap().alive);
        ledger.revive_all();
        assert!(ledger.teams().all(|t| t.alive));
    }
}
