//! Fixed-rate pacing for the control loop.
//!
//! The room actor wakes up on every pacer tick to poll the wait scheduler
//! and the audio player's busy signal. The rate only bounds how late a due
//! wait can fire; nothing in the game logic depends on it.

use std::time::{Duration, Instant};

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the loop wakes up late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrunPolicy {
    /// Skip the missed ticks and resume from now.
    #[default]
    Skip,
    /// Keep the original cadence; the next tick fires on its old schedule.
    Drop,
}

/// Pacer configuration.
#[derive(Debug, Clone)]
pub struct PacerConfig {
    /// Loop rate in Hz, clamped to `1..=MAX_RATE_HZ`.
    pub rate_hz: u32,
    pub policy: OverrunPolicy,
    /// Fraction of the tick budget (0.0–1.0) above which a tick's work is
    /// logged as slow.
    pub budget_warn_threshold: f64,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            rate_hz: 100,
            policy: OverrunPolicy::default(),
            budget_warn_threshold: 0.80,
        }
    }
}

impl PacerConfig {
    /// Maximum supported loop rate.
    pub const MAX_RATE_HZ: u32 = 1_000;

    /// A config for a specific rate with the other defaults.
    pub fn with_rate(rate_hz: u32) -> Self {
        Self {
            rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        if self.rate_hz == 0 || self.rate_hz > Self::MAX_RATE_HZ {
            let clamped = self.rate_hz.clamp(1, Self::MAX_RATE_HZ);
            warn!(rate = self.rate_hz, clamped, "pacer rate out of range, clamping");
            self.rate_hz = clamped;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Duration of one tick.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.rate_hz.max(1)))
    }
}

/// What [`Pacer::wait_for_tick`] reports.
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number, starting at 1.
    pub tick: u64,
    /// `true` if the loop woke up more than 10% of a period late.
    pub overrun: bool,
    /// Ticks skipped because of the overrun (Skip policy only).
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Pacer
// ---------------------------------------------------------------------------

/// Drives the control loop at a fixed rate.
pub struct Pacer {
    config: PacerConfig,
    period: Duration,
    tick_count: u64,
    next_tick: TokioInstant,
    tick_start: Option<Instant>,
}

impl Pacer {
    /// Creates a pacer whose first tick is one period from now.
    pub fn new(config: PacerConfig) -> Self {
        let config = config.validated();
        let period = config.period();
        debug!(rate_hz = config.rate_hz, policy = ?config.policy, "pacer created");
        Self {
            config,
            period,
            tick_count: 0,
            next_tick: TokioInstant::now() + period,
            tick_start: None,
        }
    }

    /// Waits until the next tick is due.
    ///
    /// Cancel-safe: dropping the future inside `select!` leaves the
    /// schedule untouched, so the next call waits for the same deadline.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let next = self.next_tick;
        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > self.period / 10;
        let mut ticks_skipped = 0;

        self.next_tick = match self.config.policy {
            OverrunPolicy::Skip => {
                if overrun {
                    ticks_skipped = (late_by.as_nanos() / self.period.as_nanos()) as u64;
                    if ticks_skipped > 0 {
                        warn!(
                            tick = self.tick_count,
                            skipped = ticks_skipped,
                            late_ms = late_by.as_secs_f64() * 1000.0,
                            "control loop overrun, skipping ahead"
                        );
                    }
                }
                now + self.period
            }
            OverrunPolicy::Drop => next + self.period,
        };

        trace!(tick = self.tick_count, overrun, "tick");
        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Marks the end of the work done for the current tick.
    ///
    /// Logs when the work ate most of the period. Without a preceding
    /// `wait_for_tick` this does nothing.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let utilization = start.elapsed().as_secs_f64() / self.period.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "control loop tick approaching budget"
            );
        }
    }

    /// Ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The period between ticks.
    pub fn period(&self) -> Duration {
        self.period
    }
}
