//! Repeating timer for Tourdesk's token refresh.
//!
//! Two layers:
//!
//! - [`TickScheduler`]: a fixed-interval clock. [`wait_for_tick`] resolves
//!   once per interval; a tick that fires late (the machine slept) is
//!   reported once and the next one is scheduled a full interval out.
//! - [`RepeatingTask`]: owns at most one spawned task that drives a
//!   `TickScheduler` and runs a job on every tick. Arming always disarms
//!   the previous task first, so repeated logins never stack timers.
//!
//! # Disabled mode
//!
//! When `interval` is zero, [`wait_for_tick`] pends forever and
//! [`RepeatingTask::arm`] spawns nothing. This turns automatic refresh
//! off without changing any caller.
//!
//! [`wait_for_tick`]: TickScheduler::wait_for_tick

mod error;
mod task;

pub use error::TickError;
pub use task::RepeatingTask;

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::runtime::Handle;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

/// The Tokio runtime the current thread runs in.
///
/// # Errors
/// [`TickError::NoRuntime`] outside a runtime, where no timer can be
/// spawned.
pub fn ensure_runtime() -> Result<Handle, TickError> {
    Handle::try_current().map_err(|_| TickError::NoRuntime)
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. `Duration::ZERO` disables ticking.
    pub interval: Duration,
    /// Random delay (0..max) added to the *first* tick only, so several
    /// clients started together do not hit the refresh endpoint in the
    /// same instant.
    pub initial_jitter: Duration,
    /// A job that runs longer than this is logged at `warn`.
    pub slow_run_warn: Duration,
}

impl TickConfig {
    /// Refresh cadence used when nothing else is configured.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15 * 60);

    /// Create a config for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// The tick interval, or `None` when ticking is disabled.
    pub fn tick_duration(&self) -> Option<Duration> {
        if self.interval.is_zero() {
            None
        } else {
            Some(self.interval)
        }
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            initial_jitter: Duration::ZERO,
            slow_run_warn: Duration::from_secs(10),
        }
    }
}

/// Information about a fired tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// Whole intervals missed before this tick fired.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-interval tick scheduler.
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Option<Duration>,
    tick_count: u64,
    /// When the next tick should fire (Tokio instant for `sleep_until`).
    next_tick: Option<TokioInstant>,
    /// Wall-clock instant when the current job started.
    /// Set by `wait_for_tick`, consumed by `record_tick_end`.
    tick_start: Option<Instant>,
}

impl TickScheduler {
    /// Create a new scheduler. The first tick is due one interval (plus
    /// jitter) from now.
    pub fn new(config: TickConfig) -> Self {
        let tick_duration = config.tick_duration();

        let next_tick = tick_duration.map(|d| {
            let jitter = if config.initial_jitter.is_zero() {
                Duration::ZERO
            } else {
                let max_ms = config.initial_jitter.as_millis().max(1) as u64;
                Duration::from_millis(rand::rng().random_range(0..max_ms))
            };
            TokioInstant::now() + d + jitter
        });

        match tick_duration {
            None => debug!("tick scheduler created with ticking disabled"),
            Some(d) => debug!(interval_secs = d.as_secs_f64(), "tick scheduler created"),
        }

        Self {
            config,
            tick_duration,
            tick_count: 0,
            next_tick,
            tick_start: None,
        }
    }

    /// Wait until the next tick is due.
    ///
    /// When ticking is disabled this future pends forever.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, tick_dur) = match (self.next_tick, self.tick_duration) {
            (Some(next), Some(dur)) => (next, dur),
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        // Missed intervals collapse into this one tick.
        let late_by = now.saturating_duration_since(next);
        let ticks_skipped = (late_by.as_nanos() / tick_dur.as_nanos()) as u64;
        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_secs = late_by.as_secs_f64(),
                "tick fired late, skipping ahead"
            );
        }
        self.next_tick = Some(now + tick_dur);

        trace!(tick = self.tick_count, "tick fired");

        TickInfo {
            tick: self.tick_count,
            ticks_skipped,
        }
    }

    /// Record that the job for the current tick has finished. Slow jobs
    /// are logged.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();

        if elapsed >= self.config.slow_run_warn {
            warn!(
                tick = self.tick_count,
                elapsed_secs = elapsed.as_secs_f64(),
                "tick job was slow"
            );
        }
    }

    /// Whether ticking is disabled (zero interval).
    pub fn is_disabled(&self) -> bool {
        self.tick_duration.is_none()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
