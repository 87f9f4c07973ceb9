//! Match server actor: one Tokio task that owns a match.
//!
//! The task owns the [`MatchSession`], the frame scheduler, and every AI
//! agent. Gameplay events and admin requests reach it as commands over a
//! bounded channel; replies come back on `oneshot` channels. Nothing in
//! the match is shared or locked.

use std::collections::HashMap;

use deathrope_ai::BehaviorKind;
use deathrope_match::GameModeKind;
use deathrope_protocol::{MatchSnapshot, PlayerId, RoundPhase, TeamId};
use deathrope_session::{MatchNetwork, MatchSession, SessionError};
use deathrope_tick::{TickConfig, TickScheduler};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::agent::{Agent, AgentView, standard_brain};
use crate::DeathropeError;

/// Default command channel capacity.
pub const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Requests handled by the match server task.
pub(crate) enum MatchCommand {
    StartGame {
        level: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    KillTeam {
        team: Option<TeamId>,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    AddScore {
        team: TeamId,
        reply: oneshot::Sender<Result<u32, SessionError>>,
    },
    SetGameMode {
        kind: GameModeKind,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    AddAgent {
        player: PlayerId,
        reply: oneshot::Sender<Result<(), DeathropeError>>,
    },
    UpdateView {
        player: PlayerId,
        view: AgentView,
    },
    AgentBehavior {
        player: PlayerId,
        reply: oneshot::Sender<Option<BehaviorKind>>,
    },
    Snapshot {
        reply: oneshot::Sender<MatchSnapshot>,
    },
    Pause,
    Resume,
    ForceStop {
        reason: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Shutdown,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a running match server. Cheap to clone.
#[derive(Clone)]
pub struct MatchHandle {
    sender: mpsc::Sender<MatchCommand>,
}

impl MatchHandle {
    /// Starts the first round on `level`.
    pub async fn start_game(&self, level: &str) -> Result<(), DeathropeError> {
        let level = level.to_string();
        Ok(self
            .request(|reply| MatchCommand::StartGame { level, reply })
            .await??)
    }

    /// Reports a team wiped out, or `None` to force the round to end.
    pub async fn kill_team(&self, team: Option<TeamId>) -> Result<(), DeathropeError> {
        Ok(self
            .request(|reply| MatchCommand::KillTeam { team, reply })
            .await??)
    }

    pub async fn add_score(&self, team: TeamId) -> Result<u32, DeathropeError> {
        Ok(self
            .request(|reply| MatchCommand::AddScore { team, reply })
            .await??)
    }

    pub async fn set_game_mode(&self, kind: GameModeKind) -> Result<(), DeathropeError> {
        Ok(self
            .request(|reply| MatchCommand::SetGameMode { kind, reply })
            .await??)
    }

    /// Puts `player` under control of the standard behavior brain.
    pub async fn add_agent(&self, player: PlayerId) -> Result<(), DeathropeError> {
        self.request(|reply| MatchCommand::AddAgent { player, reply })
            .await?
    }

    /// Feeds an agent what it currently perceives (fire-and-forget).
    pub async fn update_view(&self, player: PlayerId, view: AgentView) -> Result<(), DeathropeError> {
        self.sender
            .send(MatchCommand::UpdateView { player, view })
            .await
            .map_err(|_| DeathropeError::ServerUnavailable)
    }

    /// The agent's current behavior, or `None` if `player` is not an agent.
    pub async fn agent_behavior(&self, player: PlayerId) -> Result<Option<BehaviorKind>, DeathropeError> {
        self.request(|reply| MatchCommand::AgentBehavior { player, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<MatchSnapshot, DeathropeError> {
        self.request(|reply| MatchCommand::Snapshot { reply }).await
    }

    /// Freezes the simulation. Commands are still handled.
    pub async fn pause(&self) -> Result<(), DeathropeError> {
        self.send(MatchCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<(), DeathropeError> {
        self.send(MatchCommand::Resume).await
    }

    /// Ends the match immediately and tears it down.
    ///
    /// Stopping a match whose server task has already exited (the match
    /// ended on its own, or the server was shut down) is a no-op.
    pub async fn force_stop(&self, reason: &str) -> Result<(), DeathropeError> {
        let reason = reason.to_string();
        match self
            .request(|reply| MatchCommand::ForceStop { reason, reply })
            .await
        {
            Ok(result) => Ok(result?),
            Err(DeathropeError::ServerUnavailable) => {
                tracing::debug!("match server already stopped, nothing to force-stop");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Stops the server task without tearing down the match.
    pub async fn shutdown(&self) -> Result<(), DeathropeError> {
        self.send(MatchCommand::Shutdown).await
    }

    async fn send(&self, command: MatchCommand) -> Result<(), DeathropeError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| DeathropeError::ServerUnavailable)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> MatchCommand,
    ) -> Result<T, DeathropeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(command(reply_tx)).await?;
        reply_rx.await.map_err(|_| DeathropeError::ServerUnavailable)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The match server task state.
pub struct MatchServer<N: MatchNetwork> {
    session: MatchSession<N>,
    scheduler: TickScheduler,
    agents: HashMap<PlayerId, Agent>,
    receiver: mpsc::Receiver<MatchCommand>,
    last_phase: RoundPhase,
}

impl<N: MatchNetwork> MatchServer<N> {
    /// Spawns the server task for `session`.
    ///
    /// The returned join handle resolves to the final snapshot once the
    /// match is torn down or the server is shut down.
    pub fn spawn(session: MatchSession<N>, tick: TickConfig) -> (MatchHandle, JoinHandle<MatchSnapshot>) {
        Self::spawn_with_capacity(session, tick, DEFAULT_CHANNEL_SIZE)
    }

    /// Like [`spawn`](Self::spawn) with a custom command channel size.
    /// Senders wait when the channel is full.
    pub fn spawn_with_capacity(
        session: MatchSession<N>,
        tick: TickConfig,
        channel_size: usize,
    ) -> (MatchHandle, JoinHandle<MatchSnapshot>) {
        let (sender, receiver) = mpsc::channel(channel_size.max(1));
        let server = Self {
            last_phase: session.state().phase,
            session,
            scheduler: TickScheduler::new(tick),
            agents: HashMap::new(),
            receiver,
        };
        let task = tokio::spawn(server.run());
        (MatchHandle { sender }, task)
    }

    async fn run(mut self) -> MatchSnapshot {
        tracing::info!(
            rate_hz = self.scheduler.tick_rate_hz(),
            "match server started"
        );

        loop {
            tokio::select! {
                command = self.receiver.recv() => {
                    let Some(command) = command else {
                        tracing::info!("all match handles dropped");
                        break;
                    };
                    if !self.handle_command(command) {
                        break;
                    }
                }
                tick = self.scheduler.wait_for_tick() => {
                    if let Err(e) = self.session.tick(tick.sim_dt_secs()) {
                        tracing::error!(error = %e, tick = tick.tick, "simulation tick failed");
                        break;
                    }
                    self.poll_agents();
                    self.scheduler.record_tick_end();
                }
            }

            if self.session.is_torn_down() {
                tracing::info!("match torn down");
                break;
            }
        }

        tracing::info!(ticks = self.scheduler.tick_count(), "match server stopped");
        self.session.snapshot()
    }

    /// Returns `false` when the server should stop.
    fn handle_command(&mut self, command: MatchCommand) -> bool {
        match command {
            MatchCommand::StartGame { level, reply } => {
                let _ = reply.send(self.session.start_game(&level));
            }
            MatchCommand::KillTeam { team, reply } => {
                let _ = reply.send(self.session.kill_team(team));
            }
            MatchCommand::AddScore { team, reply } => {
                let _ = reply.send(self.session.add_score(team));
            }
            MatchCommand::SetGameMode { kind, reply } => {
                let _ = reply.send(self.session.set_game_mode(kind));
            }
            MatchCommand::AddAgent { player, reply } => {
                let _ = reply.send(self.add_agent(player));
            }
            MatchCommand::UpdateView { player, view } => match self.agents.get_mut(&player) {
                Some(agent) => agent.set_view(view),
                None => tracing::debug!(%player, "view for unknown agent, ignoring"),
            },
            MatchCommand::AgentBehavior { player, reply } => {
                let _ = reply.send(self.agents.get(&player).map(Agent::behavior));
            }
            MatchCommand::Snapshot { reply } => {
                let _ = reply.send(self.session.snapshot());
            }
            MatchCommand::Pause => self.scheduler.pause(),
            MatchCommand::Resume => self.scheduler.resume(),
            MatchCommand::ForceStop { reason, reply } => {
                let _ = reply.send(self.session.force_stop(&reason));
            }
            MatchCommand::Shutdown => {
                tracing::info!("match server shutting down");
                return false;
            }
        }
        true
    }

    fn add_agent(&mut self, player: PlayerId) -> Result<(), DeathropeError> {
        let agent = Agent::new(player, standard_brain()?);
        if self.agents.insert(player, agent).is_some() {
            tracing::warn!(%player, "agent replaced");
        } else {
            tracing::info!(%player, "agent added");
        }
        Ok(())
    }

    /// Agents reset at every round start and only think while the round
    /// is live.
    fn poll_agents(&mut self) {
        let phase = self.session.state().phase;
        if phase == RoundPhase::Warmup && self.last_phase != RoundPhase::Warmup {
            self.agents.values_mut().for_each(Agent::reset);
        }
        self.last_phase = phase;

        if phase == RoundPhase::RoundActive {
            for agent in self.agents.values_mut() {
                agent.tick();
            }
        }
    }
}
