//! The session aggregate owned by the phase machine.

use std::collections::BTreeSet;
use std::time::Instant;

use wolfden_protocol::{DeviceId, PhaseKind, Winner};

use crate::night::RoundState;

/// A hunter who died with a live shot and has not fired yet.
///
/// While one of these exists nothing else may move the game forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHunterShot {
    pub hunter: DeviceId,
    /// The phase the hunter died in; decides where the game resumes.
    pub died_in: PhaseKind,
}

/// Everything about the one running session that is not per-participant.
#[derive(Debug, Clone)]
pub struct Session {
    pub started: bool,
    pub over: bool,
    pub winner: Winner,
    pub round: u32,
    pub phase: PhaseKind,
    /// Seats to deal, chosen in the lobby.
    pub target_count: usize,
    /// The lobby's readiness confirmation.
    pub confirmed: bool,
    /// The current phase is not accepting actions (cue playing, role acted,
    /// role skipped).
    pub locked: bool,
    /// The seer has checked someone and the reveal delay is running.
    pub seer_pending: bool,
    pub pending_shot: Option<PendingHunterShot>,
    /// The hunter's shot is still available this game.
    pub hunter_armed: bool,
    pub idiot: Option<DeviceId>,
    pub idiot_revealed: bool,
    pub admin_approved: bool,
    pub restart_votes: BTreeSet<DeviceId>,
    pub round_state: RoundState,
    /// When the lobby's target count last moved.
    pub last_axis_step: Option<Instant>,
}

impl Session {
    /// A fresh lobby with the given target count.
    pub fn new(target_count: usize) -> Self {
        Self {
            started: false,
            over: false,
            winner: Winner::None,
            round: 1,
            phase: PhaseKind::Lobby,
            target_count,
            confirmed: false,
            locked: false,
            seer_pending: false,
            pending_shot: None,
            hunter_armed: true,
            idiot: None,
            idiot_revealed: false,
            admin_approved: false,
            restart_votes: BTreeSet::new(),
            round_state: RoundState::default(),
            last_axis_step: None,
        }
    }

    /// `true` while the lobby still takes new players.
    pub fn accepting_players(&self) -> bool {
        self.phase == PhaseKind::Lobby
    }

    /// `true` if the pending hunter is `device`.
    pub fn is_pending_hunter(&self, device: &DeviceId) -> bool {
        self.pending_shot.as_ref().is_some_and(|p| &p.hunter == device)
    }

    /// `true` if `device` is the idiot and already used the reveal.
    pub fn is_revealed_idiot(&self, device: &DeviceId) -> bool {
        self.idiot_revealed && self.idiot.as_ref() == Some(device)
    }
}
