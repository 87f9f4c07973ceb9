//! Local match: a scripted Deathrope match played by AI bots.
//!
//! Runs the match server and a client mirror in one process. The server
//! replicates over a [`ChannelNetwork`]; the mirror decodes every frame and
//! keeps its own copy of the match, which is compared with the server's
//! final snapshot at the end.
//!
//! ```text
//! RUST_LOG=info cargo run -p local-match -- settings.json
//! ```

use std::path::PathBuf;
use std::time::Duration;

use deathrope::prelude::*;
use rand::Rng;
use rand::seq::SliceRandom;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

const DEFAULT_SETTINGS: &str = "settings.json";
const GAME_LOG: &str = "gamelog.txt";

// ---------------------------------------------------------------------------
// Server setup
// ---------------------------------------------------------------------------

fn build_session(
    settings: &MatchSettings,
) -> Result<(MatchSession<ChannelNetwork>, UnboundedReceiver<NetworkEvent>), DeathropeError> {
    let (network, events) = ChannelNetwork::new();
    let mut session = MatchSession::new(
        Role::Server,
        settings.match_config.clone(),
        network,
        MatchLog::open(GAME_LOG)?,
    );
    session.set_game_mode(settings.game_mode)?;
    session.set_number_of_players(settings.teams)?;

    // Teams face each other along the x axis, players side by side.
    for team in 0..settings.teams as u32 {
        let x = team as f32 * 10.0;
        session.set_spawn(
            TeamId(team),
            Position::new(x, 0.0, -1.5),
            Position::new(x, 0.0, 1.5),
        )?;
    }
    Ok((session, events))
}

fn bots(teams: usize) -> impl Iterator<Item = PlayerId> {
    (0..(teams * PLAYERS_PER_TEAM) as u64).map(PlayerId)
}

// ---------------------------------------------------------------------------
// Client mirror
// ---------------------------------------------------------------------------

/// Applies every replicated frame to a client-side session until the
/// server's network goes away, then returns the mirrored snapshot.
fn spawn_mirror(
    settings: &MatchSettings,
    mut events: UnboundedReceiver<NetworkEvent>,
) -> JoinHandle<Result<MatchSnapshot, DeathropeError>> {
    let (network, client_events) = ChannelNetwork::new();
    let mut client = MatchSession::new(
        Role::Client,
        settings.match_config.clone(),
        network,
        MatchLog::new(std::env::temp_dir().join("deathrope-client-log.txt")),
    );

    tokio::spawn(async move {
        // Keeps the client's own network open for `disconnect`.
        let _client_events = client_events;
        while let Some(event) = events.recv().await {
            match event {
                NetworkEvent::Send { frame, .. } => {
                    client.apply_frame(&frame)?;
                }
                NetworkEvent::ChangeScene(scene) => tracing::info!(%scene, "mirror: scene change"),
                NetworkEvent::StopServer { offline_scene } => {
                    tracing::info!(%offline_scene, "mirror: server stopped");
                    client.disconnect()?;
                }
                other => tracing::debug!(?other, "mirror: network call"),
            }
        }
        Ok::<_, DeathropeError>(client.snapshot())
    })
}

// ---------------------------------------------------------------------------
// Scripted play
// ---------------------------------------------------------------------------

fn random_view() -> AgentView {
    let mut rng = rand::rng();
    AgentView {
        enemy_in_range: rng.random_bool(0.4),
        power_up_nearby: rng.random_bool(0.2),
        holding_power_up: rng.random_bool(0.1),
    }
}

fn elimination_order(teams: usize) -> Vec<TeamId> {
    let mut order: Vec<TeamId> = (0..teams as u32).map(TeamId).collect();
    order.shuffle(&mut rand::rng());
    order
}

fn pause_before_kill() -> Duration {
    Duration::from_millis(rand::rng().random_range(500..4_000))
}

/// Current phase, or `None` once the server task has finished.
async fn phase(handle: &MatchHandle) -> Result<Option<RoundPhase>, DeathropeError> {
    match handle.snapshot().await {
        Ok(snapshot) => Ok(Some(snapshot.phase)),
        Err(DeathropeError::ServerUnavailable) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Plays rounds until the server task finishes.
async fn play(handle: &MatchHandle, teams: usize) -> Result<(), DeathropeError> {
    while let Some(current) = phase(handle).await? {
        if current != RoundPhase::RoundActive {
            tokio::time::sleep(Duration::from_millis(100)).await;
            continue;
        }

        for bot in bots(teams) {
            handle.update_view(bot, random_view()).await?;
        }

        // Eliminate teams one by one until the round is decided.
        for team in elimination_order(teams) {
            tokio::time::sleep(pause_before_kill()).await;
            if phase(handle).await? != Some(RoundPhase::RoundActive) {
                break;
            }
            tracing::info!(%team, "team wiped out");
            match handle.kill_team(Some(team)).await {
                Ok(()) => {}
                Err(DeathropeError::ServerUnavailable) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS));
    let settings = MatchSettings::load(&path)?;
    tracing::info!(
        path = %path.display(),
        level = %settings.level,
        teams = settings.teams,
        mode = ?settings.game_mode,
        "settings loaded"
    );

    let (session, events) = build_session(&settings)?;
    let mirror = spawn_mirror(&settings, events);
    let (handle, server) = MatchServer::spawn(session, settings.tick.clone());

    for bot in bots(settings.teams) {
        handle.add_agent(bot).await?;
    }
    handle.start_game(&settings.level).await?;

    play(&handle, settings.teams).await?;
    drop(handle);

    let final_snapshot = server.await?;
    let mirrored = mirror.await??;

    for score in &final_snapshot.scores {
        tracing::info!(team = %score.team, score = score.score, "final score");
    }
    if mirrored.scores == final_snapshot.scores && mirrored.phase == final_snapshot.phase {
        tracing::info!("client mirror matches the server");
    } else {
        tracing::warn!(?mirrored, "client mirror diverged from the server");
    }
    Ok(())
}
