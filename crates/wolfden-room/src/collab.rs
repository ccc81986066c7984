//! The external collaborators the control loop talks to.
//!
//! Audio, the local status display and the physical lobby controls live
//! outside this crate. The room actor only needs the narrow contracts below.

use tracing::info;

use crate::view::StatusReport;

/// Plays numbered narration cues.
///
/// `is_busy` is polled on every loop tick and must return immediately.
/// An implementation that cannot tell may always return `false`; the
/// scheduler then falls back to the configured settle delays.
pub trait CuePlayer: Send + 'static {
    fn play(&mut self, cue: u16, blocking: bool);

    fn is_busy(&self) -> bool;
}

/// A cue player with no speaker: logs each cue and is never busy.
#[derive(Debug, Default)]
pub struct SilentCue;

impl CuePlayer for SilentCue {
    fn play(&mut self, cue: u16, blocking: bool) {
        info!(cue, blocking, "cue");
    }

    fn is_busy(&self) -> bool {
        false
    }
}

/// Receives the coarse status line after every change.
pub trait StatusDisplay: Send + 'static {
    fn show(&mut self, report: &StatusReport);
}

/// A status display that writes to the log.
#[derive(Debug, Default)]
pub struct LogStatus;

impl StatusDisplay for LogStatus {
    fn show(&mut self, report: &StatusReport) {
        info!(
            label = report.label,
            round = report.round,
            players = report.current_count,
            target = report.target_count,
            votes = report.votes,
            countdown = report.countdown,
            winner = ?report.winner,
            "status"
        );
    }
}

/// One reading from the lobby controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSample {
    /// Raw joystick axis reading (0–4095 on the original hardware).
    Axis(i32),
    /// The confirm button.
    Press,
}
