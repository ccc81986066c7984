//! Non-blocking timing for Wolfden.
//!
//! Two pieces, both free of blocking sleeps in the game path:
//!
//! - [`WaitScheduler`]: epoch-tagged waits (fixed delay, countdown, cue
//!   completion with a capped timeout). Pure bookkeeping: it is handed the
//!   current `Instant` and the audio player's busy bit and answers "what is
//!   due now?".
//! - [`Pacer`]: the fixed-rate tick the control loop selects on, so the
//!   scheduler gets polled while no participant is sending anything.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* participant actions */ }
//!         _ = pacer.wait_for_tick() => {
//!             while let Some(fired) = waits.poll(Instant::now(), cue.is_busy()) {
//!                 machine.apply(fired.on_complete);
//!             }
//!             pacer.record_tick_end();
//!         }
//!     }
//! }
//! ```

mod pacer;
mod waits;

pub use pacer::{OverrunPolicy, Pacer, PacerConfig, TickInfo};
pub use waits::{Epoch, Fired, ScheduledWait, WaitKind, WaitScheduler};
