//! Epoch-tagged, polled waits.
//!
//! Nothing in the controller ever sleeps. Instead the state machine
//! registers a wait ("call me back with `T` in 3 s", "call me back with `T`
//! once the audio player goes quiet") and the control loop polls the
//! scheduler every iteration.
//!
//! # Staleness
//!
//! Every wait is stamped with the scheduler's current [`Epoch`]. The owner
//! calls [`WaitScheduler::supersede`] on every phase change, which bumps the
//! epoch. From then on the older waits can never fire: [`WaitScheduler::poll`]
//! discards them the first time it sees them. A skip-delay scheduled for the
//! Guard phase therefore cannot advance a Wolf phase that a guard's direct
//! action already opened.
//!
//! # One at a time
//!
//! `poll` hands out at most one due wait per call. Firing a wait usually
//! changes the phase (and the epoch), so the caller loops
//! `while let Some(fired) = poll(..)` and every later wait is re-checked
//! against the epoch that the previous one left behind.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

/// Generation counter stamped on waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(u64);

impl Epoch {
    /// The raw counter value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// The three kinds of wait the controller uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitKind {
    /// Until the external audio cue stops playing (or the timeout cap).
    CueCompletion,
    /// A plain delay used for pacing.
    FixedDelay,
    /// A delay whose remaining time is shown to participants.
    Countdown,
}

/// A registered wait.
#[derive(Debug, Clone)]
pub struct ScheduledWait<T> {
    pub kind: WaitKind,
    pub epoch: Epoch,
    /// Earliest instant the wait may fire. For cue waits this is the settle
    /// point after which an idle player counts as "finished".
    ready_at: Instant,
    /// Instant the wait fires regardless of the cue (cue waits only).
    give_up_at: Option<Instant>,
    pub on_complete: T,
}

impl<T> ScheduledWait<T> {
    /// Returns `Some(timed_out)` if the wait is due at `now`.
    fn due(&self, now: Instant, cue_busy: bool) -> Option<bool> {
        match self.kind {
            WaitKind::FixedDelay | WaitKind::Countdown => (now >= self.ready_at).then_some(false),
            WaitKind::CueCompletion => {
                if now >= self.ready_at && !cue_busy {
                    Some(false)
                } else if self.give_up_at.is_some_and(|t| now >= t) {
                    Some(true)
                } else {
                    None
                }
            }
        }
    }
}

/// A wait that came due, handed back to the owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub kind: WaitKind,
    pub epoch: Epoch,
    /// `true` if a cue wait gave up on the cue instead of seeing it finish.
    pub timed_out: bool,
    pub on_complete: T,
}

/// Outstanding waits for one state machine.
#[derive(Debug, Clone)]
pub struct WaitScheduler<T> {
    waits: Vec<ScheduledWait<T>>,
    epoch: Epoch,
    cue_timeout_cap: Duration,
}

impl<T> WaitScheduler<T> {
    /// Creates an empty scheduler.
    ///
    /// `cue_timeout_cap` bounds every cue wait: a player that reports busy
    /// forever only ever delays the game by this much.
    pub fn new(cue_timeout_cap: Duration) -> Self {
        Self {
            waits: Vec::new(),
            epoch: Epoch::default(),
            cue_timeout_cap,
        }
    }

    /// The epoch new waits are stamped with.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Starts a new epoch. Every wait registered before this call is stale.
    pub fn supersede(&mut self) -> Epoch {
        self.epoch = Epoch(self.epoch.0 + 1);
        trace!(epoch = %self.epoch, outstanding = self.waits.len(), "epoch superseded");
        self.epoch
    }

    /// Registers a fixed delay.
    pub fn delay(&mut self, now: Instant, delay: Duration, on_complete: T) {
        self.push(WaitKind::FixedDelay, now + delay, None, on_complete);
    }

    /// Registers a delay whose remaining time is displayed.
    pub fn countdown(&mut self, now: Instant, length: Duration, on_complete: T) {
        self.push(WaitKind::Countdown, now + length, None, on_complete);
    }

    /// Registers a wait for the audio cue to finish.
    ///
    /// The wait ignores the busy signal until `settle` has passed (the
    /// player needs a moment before it reports busy at all), then fires as
    /// soon as the player is idle. `timeout` is clamped to the scheduler's
    /// cap and measured from `now`.
    pub fn cue(&mut self, now: Instant, settle: Duration, timeout: Duration, on_complete: T) {
        let timeout = timeout.min(self.cue_timeout_cap).max(settle);
        self.push(
            WaitKind::CueCompletion,
            now + settle,
            Some(now + timeout),
            on_complete,
        );
    }

    fn push(&mut self, kind: WaitKind, ready_at: Instant, give_up_at: Option<Instant>, on_complete: T) {
        self.waits.push(ScheduledWait {
            kind,
            epoch: self.epoch,
            ready_at,
            give_up_at,
            on_complete,
        });
    }

    /// Returns the first due wait of the current epoch, removing it.
    ///
    /// Stale waits found along the way are dropped, never returned.
    pub fn poll(&mut self, now: Instant, cue_busy: bool) -> Option<Fired<T>> {
        let current = self.epoch;
        let before = self.waits.len();
        self.waits.retain(|w| w.epoch == current);
        let dropped = before - self.waits.len();
        if dropped > 0 {
            debug!(dropped, epoch = %current, "discarded stale waits");
        }

        let (index, timed_out) = self
            .waits
            .iter()
            .enumerate()
            .find_map(|(i, w)| w.due(now, cue_busy).map(|t| (i, t)))?;

        let wait = self.waits.remove(index);
        if timed_out {
            warn!(epoch = %wait.epoch, "cue did not finish in time, moving on");
        }
        Some(Fired {
            kind: wait.kind,
            epoch: wait.epoch,
            timed_out,
            on_complete: wait.on_complete,
        })
    }

    /// Time left on the current epoch's countdown, if one is running.
    pub fn countdown_remaining(&self, now: Instant) -> Option<Duration> {
        self.waits
            .iter()
            .find(|w| w.kind == WaitKind::Countdown && w.epoch == self.epoch)
            .map(|w| w.ready_at.saturating_duration_since(now))
    }

    /// `true` if a wait of `kind` is registered for the current epoch.
    pub fn has_pending(&self, kind: WaitKind) -> bool {
        self.waits.iter().any(|w| w.kind == kind && w.epoch == self.epoch)
    }

    /// Number of registered waits, stale ones included until the next poll.
    pub fn len(&self) -> usize {
        self.waits.len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.waits.is_empty()
    }

    /// Drops every wait and starts a fresh epoch.
    pub fn clear(&mut self) {
        self.waits.clear();
        self.supersede();
    }
}
