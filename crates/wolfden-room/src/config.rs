//! Game configuration: seat bounds, pacing, and the audio cue table.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use wolfden_protocol::{PhaseKind, Winner};

// ---------------------------------------------------------------------------
// CueTable
// ---------------------------------------------------------------------------

/// Track numbers on the audio player for every narration cue.
///
/// The numbers are whatever order the narration files were copied onto the
/// player's storage; only the controller knows what they mean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueTable {
    pub night_falls: u16,
    pub wolf_open: u16,
    pub wolf_close: u16,
    pub seer_open: u16,
    pub seer_close: u16,
    pub witch_open: u16,
    pub witch_close: u16,
    pub day_open: u16,
    pub guard_open: u16,
    pub guard_close: u16,
    pub hunter_prompt: u16,
    pub hunter_shot: u16,
    pub humans_win: u16,
    pub wolves_win: u16,
}

impl Default for CueTable {
    fn default() -> Self {
        Self {
            night_falls: 1,
            wolf_open: 2,
            wolf_close: 3,
            seer_open: 4,
            seer_close: 5,
            witch_open: 6,
            witch_close: 8,
            day_open: 9,
            guard_open: 12,
            guard_close: 13,
            hunter_prompt: 14,
            hunter_shot: 15,
            humans_win: 20,
            wolves_win: 21,
        }
    }
}

impl CueTable {
    /// The cue that opens `phase`, if it has one.
    pub fn opening(&self, phase: PhaseKind) -> Option<u16> {
        match phase {
            PhaseKind::Guard => Some(self.guard_open),
            PhaseKind::Wolf => Some(self.wolf_open),
            PhaseKind::Seer => Some(self.seer_open),
            PhaseKind::Witch => Some(self.witch_open),
            PhaseKind::Day => Some(self.day_open),
            _ => None,
        }
    }

    /// The cue that closes a night phase once its role has acted.
    pub fn closing(&self, phase: PhaseKind) -> Option<u16> {
        match phase {
            PhaseKind::Guard => Some(self.guard_close),
            PhaseKind::Wolf => Some(self.wolf_close),
            PhaseKind::Seer => Some(self.seer_close),
            PhaseKind::Witch => Some(self.witch_close),
            _ => None,
        }
    }

    /// The victory cue for `winner`.
    pub fn victory(&self, winner: Winner) -> Option<u16> {
        match winner {
            Winner::Humans => Some(self.humans_win),
            Winner::Wolves => Some(self.wolves_win),
            Winner::None => None,
        }
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Configuration for the single game session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Smallest target count the lobby accepts.
    pub min_players: usize,

    /// Largest target count the lobby accepts.
    pub max_players: usize,

    /// Target count the lobby starts at.
    pub default_players: usize,

    /// Length of the "game starts in..." countdown.
    pub countdown: Duration,

    /// Pause after entering a phase before its opening cue may play.
    pub phase_settle: Duration,

    /// Upper bound on any wait for an audio cue to finish.
    pub cue_timeout: Duration,

    /// How long the seer's result stays on screen before the Witch phase.
    pub seer_reveal_delay: Duration,

    /// How long a phase without a living role holder pretends to wait.
    pub skip_delay: Duration,

    /// Upper bound on waiting for the gunshot cue after a daytime shot.
    pub hunter_shot_cue_timeout: Duration,

    /// Raw joystick reading below which the target count goes down.
    pub axis_low: i32,

    /// Raw joystick reading above which the target count goes up.
    pub axis_high: i32,

    /// Minimum spacing between two target-count steps.
    pub axis_repeat: Duration,

    /// Seed for the dealer's shuffle. `None` seeds from the OS.
    pub seed: Option<u64>,

    pub cues: CueTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 6,
            max_players: 15,
            default_players: 7,
            countdown: Duration::from_secs(4),
            phase_settle: Duration::from_secs(2),
            cue_timeout: Duration::from_secs(5),
            seer_reveal_delay: Duration::from_millis(5500),
            skip_delay: Duration::from_secs(3),
            hunter_shot_cue_timeout: Duration::from_millis(3500),
            axis_low: 400,
            axis_high: 3600,
            axis_repeat: Duration::from_millis(200),
            seed: None,
            cues: CueTable::default(),
        }
    }
}

impl GameConfig {
    /// A default config with a fixed dealer seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Clamps a requested target count into the lobby's bounds.
    pub fn clamp_players(&self, count: usize) -> usize {
        count.clamp(self.min_players, self.max_players)
    }
}
