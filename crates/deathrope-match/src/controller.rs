//! The round controller: capability set shared by every game mode, and the
//! lifecycle steps they have in common.

use deathrope_protocol::{MatchMessage, RoundPhase, TeamId};

use crate::{Ledger, MatchConfig, MatchEffect, MatchError, RoundState};

/// Mutable view of the match handed to a controller for one call.
///
/// The session owns all three pieces; a controller only borrows them.
pub struct MatchContext<'a> {
    pub config: &'a MatchConfig,
    pub ledger: &'a mut Ledger,
    pub state: &'a mut RoundState,
}

/// What every game mode can do.
///
/// Only [`kill_team`](Self::kill_team) differs between modes; the round
/// start, scoring and timer handling are shared defaults.
pub trait RoundController {
    /// A team was eliminated, or `None` to force the round to end without
    /// awarding anyone.
    fn kill_team(&mut self, ctx: &mut MatchContext<'_>, team: Option<TeamId>) -> Vec<MatchEffect>;

    /// Gives `team` one point.
    ///
    /// Clears `match_active` until the caller re-arms it, so nothing treats
    /// the match as live while scores are being settled.
    fn add_score(&mut self, ctx: &mut MatchContext<'_>, team: TeamId) -> Result<u32, MatchError> {
        let score = ctx.ledger.add_score(team)?;
        ctx.state.match_active = false;
        Ok(score)
    }

    /// Resets per-round state and starts the pre-round countdown.
    fn begin_round(&mut self, ctx: &mut MatchContext<'_>) -> Vec<MatchEffect> {
        begin_round(ctx)
    }

    /// Advances timers by `dt` seconds.
    ///
    /// - Warmup: the countdown runs; at zero the round goes live.
    /// - RoundActive: the round clock runs; at zero the round is forced
    ///   to end with `kill_team(None)`.
    /// - RoundEnding: the cooldown runs; at zero the next round begins.
    fn on_tick(&mut self, ctx: &mut MatchContext<'_>, dt: f32) -> Vec<MatchEffect> {
        match ctx.state.phase {
            RoundPhase::Warmup => {
                ctx.state.countdown_timer = (ctx.state.countdown_timer - dt).max(0.0);
                if ctx.state.countdown_timer <= 0.0 {
                    go_live(ctx.state);
                }
                Vec::new()
            }
            RoundPhase::RoundActive => {
                ctx.state.time_remaining = (ctx.state.time_remaining - dt).max(0.0);
                if ctx.state.time_remaining <= 0.0 {
                    tracing::info!(round = ctx.state.current_round, "round clock expired");
                    self.kill_team(ctx, None)
                } else {
                    Vec::new()
                }
            }
            RoundPhase::RoundEnding if ctx.state.next_round_pending => {
                ctx.state.time_before_next_round -= dt;
                if ctx.state.time_before_next_round <= 0.0 {
                    self.begin_round(ctx)
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared lifecycle steps
// ---------------------------------------------------------------------------

/// Starts the countdown for the next round.
pub(crate) fn begin_round(ctx: &mut MatchContext<'_>) -> Vec<MatchEffect> {
    let state = &mut *ctx.state;
    if state.phase.is_terminal() {
        tracing::debug!("match already complete, not starting another round");
        return Vec::new();
    }

    state.next_round_pending = false;
    state.time_before_next_round = ctx.config.time_before_next_round_secs;
    state.time_remaining = ctx.config.time_remaining_secs;
    state.countdown_timer = ctx.config.countdown_secs;
    state.countdown_over = false;
    state.match_started = true;
    state.match_active = true;
    state.phase = RoundPhase::Warmup;
    ctx.ledger.revive_all();

    tracing::info!(
        round = state.current_round,
        round_limit = state.round_limit,
        "round starting"
    );

    if state.countdown_timer <= 0.0 {
        go_live(state);
    }

    vec![MatchEffect::to_all(MatchMessage::RoundStarted {
        round: state.current_round,
    })]
}

fn go_live(state: &mut RoundState) {
    state.countdown_timer = 0.0;
    state.countdown_over = true;
    state.phase = RoundPhase::RoundActive;
    tracing::info!(round = state.current_round, "countdown over, round live");
}

/// Returns `true` if a round-ending event should be processed now.
///
/// Rejects duplicates while a round end is pending and anything outside
/// live play. The countdown does not count as live play.
pub(crate) fn accepts_round_end(state: &RoundState, team: Option<TeamId>) -> bool {
    if state.next_round_pending {
        tracing::debug!(?team, "round end already pending, ignoring");
        return false;
    }
    if state.phase != RoundPhase::RoundActive {
        tracing::debug!(?team, phase = %state.phase, "round not in play, ignoring");
        return false;
    }
    true
}

/// Gives a point to every spawned team except `eliminated` and returns the
/// effects announcing it: one score broadcast plus a log line per winner.
pub(crate) fn award_all_except<R>(
    controller: &mut R,
    ctx: &mut MatchContext<'_>,
    eliminated: TeamId,
    describe: impl Fn(&str, f32) -> String,
) -> Vec<MatchEffect>
where
    R: RoundController + ?Sized,
{
    if ctx.ledger.mark_eliminated(eliminated).is_err() {
        tracing::warn!(team = %eliminated, "eliminated team is not in the ledger");
    }

    let mut effects = Vec::new();
    for winner in ctx.ledger.others(eliminated) {
        match controller.add_score(ctx, winner) {
            Ok(score) => {
                if let Some(team) = ctx.ledger.get(winner) {
                    tracing::info!(team = %team.name, score, "point awarded");
                    effects.push(MatchEffect::Log(describe(&team.name, ctx.state.time_remaining)));
                }
            }
            Err(e) => tracing::warn!(error = %e, "skipping score for unknown team"),
        }
    }

    effects.insert(
        0,
        MatchEffect::to_all(MatchMessage::ScoreUpdate {
            scores: ctx.ledger.scores(),
        }),
    );
    effects
}

/// Closes the current round: advances the counter, resets the round clock,
/// arms the cooldown, and ends the match when the limit is reached.
pub(crate) fn finish_round(ctx: &mut MatchContext<'_>, effects: &mut Vec<MatchEffect>) {
    let state = &mut *ctx.state;
    state.current_round = (state.current_round + 1).min(state.round_limit);
    effects.push(MatchEffect::to_all(MatchMessage::RoundAdvanced {
        round: state.current_round,
        round_limit: state.round_limit,
    }));

    if state.is_match_over() {
        complete_match(ctx, effects);
    } else {
        // Re-armed only while rounds remain, so a finished match stays
        // inactive.
        state.match_active = true;
        state.phase = RoundPhase::RoundEnding;
        state.time_before_next_round = ctx.config.time_before_next_round_secs;
        tracing::info!(
            round = state.current_round,
            cooldown_secs = state.time_before_next_round,
            "round over, next round pending"
        );
    }

    ctx.state.time_remaining = ctx.config.time_remaining_secs;
    ctx.state.next_round_pending = true;
}

fn complete_match(ctx: &mut MatchContext<'_>, effects: &mut Vec<MatchEffect>) {
    let state = &mut *ctx.state;
    state.match_active = false;
    state.active_players = 0;
    state.phase = RoundPhase::MatchComplete;

    tracing::info!(rounds = state.current_round, "match complete");

    let scores = ctx.ledger.scores();
    let summary = scores
        .iter()
        .map(|s| format!("{} {}", s.name, s.score))
        .collect::<Vec<_>>()
        .join(", ");
    effects.push(MatchEffect::Log(format!(
        "Match over after {} rounds: {summary}",
        state.current_round
    )));
    effects.push(MatchEffect::to_all(MatchMessage::MatchEnded { scores }));
    effects.push(MatchEffect::Teardown {
        offline_scene: ctx.config.offline_scene.clone(),
    });
}
