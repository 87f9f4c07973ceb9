//! Integration tests for the frame scheduler.
//!
//! Tokio time is paused so `sleep_until` resolves as soon as the runtime
//! auto-advances the clock.

use std::time::Duration;

use deathrope_tick::{TickConfig, TickInfo, TickScheduler};

fn server_rate() -> TickConfig {
    TickConfig {
        initial_jitter_us: 0,
        ..TickConfig::with_rate(20)
    }
}

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_is_60hz() {
    let config = TickConfig::default();
    assert_eq!(config.tick_rate_hz, 60);
    assert_eq!(config.tick_duration(), Duration::from_secs_f64(1.0 / 60.0));
}

#[test]
fn test_validated_clamps_rate() {
    assert_eq!(TickConfig::with_rate(0).validated().tick_rate_hz, 1);
    assert_eq!(TickConfig::with_rate(1_000).validated().tick_rate_hz, 240);
    assert_eq!(TickConfig::with_rate(30).validated().tick_rate_hz, 30);
}

#[test]
fn test_config_deserializes_with_defaults() {
    let config: TickConfig = serde_json::from_str(r#"{"tick_rate_hz": 30}"#).unwrap();
    assert_eq!(config.tick_rate_hz, 30);
    assert_eq!(config.max_skipped_frames, 5);
}

#[test]
fn test_sim_dt_counts_skipped_frames() {
    let frame = TickInfo {
        tick: 4,
        dt: Duration::from_millis(50),
        overrun: true,
        ticks_skipped: 2,
    };
    assert!((frame.sim_dt_secs() - 0.15).abs() < 1e-6);
}

// =========================================================================
// Firing
// =========================================================================

#[test]
fn test_new_scheduler_has_not_fired() {
    let frames = TickScheduler::new(server_rate());
    assert_eq!(frames.tick_count(), 0);
    assert_eq!(frames.tick_rate_hz(), 20);
    assert_eq!(frames.tick_duration(), Duration::from_millis(50));
    assert!(!frames.is_paused());
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_tick_fires_fixed_frames() {
    let mut frames = TickScheduler::new(server_rate());

    for expected in 1..=3 {
        let frame = frames.wait_for_tick().await;
        assert_eq!(frame.tick, expected);
        assert_eq!(frame.dt, Duration::from_millis(50));
        assert!(!frame.overrun);
        assert_eq!(frame.ticks_skipped, 0);
    }
    assert_eq!(frames.metrics().total_ticks, 3);
}

#[tokio::test(start_paused = true)]
async fn test_late_frame_reports_skipped_frames() {
    let mut frames = TickScheduler::new(server_rate());
    frames.wait_for_tick().await;

    // Stall for three frames' worth.
    tokio::time::advance(Duration::from_millis(200)).await;
    let frame = frames.wait_for_tick().await;

    assert!(frame.overrun);
    assert_eq!(frame.ticks_skipped, 3);
    assert_eq!(frames.metrics().total_overruns, 1);
}

#[tokio::test(start_paused = true)]
async fn test_skipped_frames_capped() {
    let mut frames = TickScheduler::new(TickConfig {
        max_skipped_frames: 2,
        ..server_rate()
    });
    frames.wait_for_tick().await;

    tokio::time::advance(Duration::from_secs(2)).await;
    let frame = frames.wait_for_tick().await;

    assert_eq!(frame.ticks_skipped, 2);
}

// =========================================================================
// Pause / resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_holds_round_clock() {
    let mut frames = TickScheduler::new(server_rate());
    frames.wait_for_tick().await;

    frames.pause();
    let result = tokio::time::timeout(Duration::from_secs(1), frames.wait_for_tick()).await;

    assert!(result.is_err(), "no frames while the match is paused");
    assert_eq!(frames.tick_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resume_does_not_count_pause_as_overrun() {
    let mut frames = TickScheduler::new(server_rate());
    frames.wait_for_tick().await;
    frames.pause();
    tokio::time::advance(Duration::from_secs(5)).await;

    frames.resume();
    let frame = frames.wait_for_tick().await;

    assert_eq!(frame.tick, 2);
    assert!(!frame.overrun);
}

#[tokio::test]
async fn test_pause_and_resume_twice_are_noops() {
    let mut frames = TickScheduler::new(server_rate());
    frames.pause();
    frames.pause();
    assert!(frames.is_paused());
    frames.resume();
    frames.resume();
    assert!(!frames.is_paused());
}

// =========================================================================
// Budget
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_record_tick_end_tracks_slowest_frame() {
    let mut frames = TickScheduler::new(server_rate());
    frames.record_tick_end();
    assert_eq!(frames.metrics().max_tick_time, Duration::ZERO);

    frames.wait_for_tick().await;
    // record_tick_end measures wall-clock time.
    std::thread::sleep(Duration::from_micros(50));
    frames.record_tick_end();

    assert!(frames.metrics().max_tick_time > Duration::ZERO);
}

// =========================================================================
// select! loop
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_frames_drive_match_clock_until_command() {
    let mut frames = TickScheduler::new(server_rate());
    let (admin, mut commands) = tokio::sync::mpsc::channel::<&str>(1);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(160)).await;
        admin.send("stop").await.ok();
    });

    let mut match_clock = 0.0f32;
    let mut frames_run = 0u64;
    loop {
        tokio::select! {
            Some(command) = commands.recv() => {
                assert_eq!(command, "stop");
                break;
            }
            frame = frames.wait_for_tick() => {
                frames_run += 1;
                match_clock += frame.sim_dt_secs();
                frames.record_tick_end();
            }
        }
    }

    assert!(frames_run >= 3, "expected at least 3 frames, got {frames_run}");
    assert!(match_clock >= 0.15);
}
