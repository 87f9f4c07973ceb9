//! Fixed-timestep frame scheduler for Deathrope matches.
//!
//! The match simulation advances in fixed frames. Round countdowns and the
//! round clock are driven by the seconds reported here, never by wall-clock
//! reads inside the match core.
//!
//! When the server falls behind, missed frames are skipped rather than
//! replayed, and the next [`TickInfo`] reports how many were skipped so
//! the match clock can still account for the lost time
//! ([`TickInfo::sim_dt_secs`]).
//!
//! The scheduler is meant to sit in the match server's `tokio::select!`:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(command) = commands.recv() => server.handle(command),
//!         tick = scheduler.wait_for_tick() => {
//!             session.tick(tick.sim_dt_secs())?;
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Frame scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Simulation frames per second.
    pub tick_rate_hz: u32,

    /// Frames a single late tick may account for in
    /// [`TickInfo::sim_dt_secs`]. Caps the jump in match timers after a
    /// long stall.
    pub max_skipped_frames: u32,

    /// Random delay (0..max µs) added to the first frame so matches started
    /// together do not tick in lockstep.
    pub initial_jitter_us: u64,

    /// Fraction of the frame budget (0.0..=1.0) above which a slow frame is
    /// logged.
    pub budget_warn_threshold: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            max_skipped_frames: 5,
            initial_jitter_us: 0,
            budget_warn_threshold: 0.80,
        }
    }
}

impl TickConfig {
    pub const MIN_TICK_RATE_HZ: u32 = 1;
    pub const MAX_TICK_RATE_HZ: u32 = 240;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values. Called by [`TickScheduler::new`].
    ///
    /// - `tick_rate_hz` clamped to `MIN_TICK_RATE_HZ..=MAX_TICK_RATE_HZ`.
    /// - `budget_warn_threshold` clamped to `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        let clamped = self
            .tick_rate_hz
            .clamp(Self::MIN_TICK_RATE_HZ, Self::MAX_TICK_RATE_HZ);
        if clamped != self.tick_rate_hz {
            warn!(
                rate = self.tick_rate_hz,
                clamped,
                "tick_rate_hz out of range, clamping"
            );
            self.tick_rate_hz = clamped;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Length of one frame.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }
}

// ---------------------------------------------------------------------------
// TickInfo
// ---------------------------------------------------------------------------

/// One fired frame, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct TickInfo {
    /// Frame number, starting at 1.
    pub tick: u64,
    /// Fixed frame length.
    pub dt: Duration,
    /// The frame fired more than 10% late.
    pub overrun: bool,
    /// Whole frames missed before this one (capped by
    /// `max_skipped_frames`).
    pub ticks_skipped: u64,
}

impl TickInfo {
    /// Seconds of match time this frame stands for: its own length plus
    /// any skipped frames.
    pub fn sim_dt_secs(&self) -> f32 {
        (self.dt.as_secs_f64() * (1 + self.ticks_skipped) as f64) as f32
    }
}

/// Running counters.
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Slowest frame reported through `record_tick_end`.
    pub max_tick_time: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-timestep frame source. One per match.
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Duration,
    tick_count: u64,
    next_tick: TokioInstant,
    /// Wall-clock start of the current frame's simulation work.
    frame_started: Option<Instant>,
    paused: bool,
    metrics: TickMetrics,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        let jitter = if config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
        } else {
            Duration::ZERO
        };

        debug!(
            rate_hz = config.tick_rate_hz,
            frame_ms = tick_duration.as_secs_f64() * 1000.0,
            jitter_us = jitter.as_micros() as u64,
            "tick scheduler created"
        );

        Self {
            next_tick: TokioInstant::now() + tick_duration + jitter,
            config,
            tick_duration,
            tick_count: 0,
            frame_started: None,
            paused: false,
            metrics: TickMetrics::default(),
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits for the next frame.
    ///
    /// While paused this future never resolves; other `select!` branches
    /// keep running.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        if self.paused {
            std::future::pending::<()>().await;
        }

        let due = self.next_tick;
        time::sleep_until(due).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.frame_started = Some(Instant::now());

        let late_by = now.saturating_duration_since(due);
        let overrun = late_by > self.tick_duration / 10;
        let mut ticks_skipped = 0;
        if overrun {
            let behind = (late_by.as_nanos() / self.tick_duration.as_nanos()) as u64;
            ticks_skipped = behind.min(self.config.max_skipped_frames as u64);
            self.metrics.total_overruns += 1;
            if behind > 0 {
                warn!(
                    tick = self.tick_count,
                    behind,
                    late_ms = late_by.as_secs_f64() * 1000.0,
                    "frame overrun, skipping ahead"
                );
            }
        }

        // Always from now: missed frames are not replayed.
        self.next_tick = now + self.tick_duration;
        self.metrics.total_ticks += 1;
        self.metrics.total_skipped += ticks_skipped;

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: self.tick_duration,
            overrun,
            ticks_skipped,
        }
    }

    /// Marks the end of the simulation work for the current frame and
    /// warns if it ate too much of the frame budget.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.frame_started.take() else {
            return;
        };
        let elapsed = start.elapsed();
        self.metrics.max_tick_time = self.metrics.max_tick_time.max(elapsed);

        let utilization = elapsed.as_secs_f64() / self.tick_duration.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "frame approaching budget"
            );
        }
    }

    /// Stops frames until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Restarts frames one frame from now, so time spent paused is not
    /// counted as overrun.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = TokioInstant::now() + self.tick_duration;
            debug!(tick = self.tick_count, "tick scheduler resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }
}
