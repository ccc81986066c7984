//! Core protocol types for Wolfden's wire format.
//!
//! Everything in this module travels between the controller and the
//! participants' phones as JSON. The shapes are fixed by the browser client:
//! inbound actions are flat `{deviceId, action, targetId}` objects, outbound
//! messages are internally tagged with a `type` field.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A stable identifier chosen by a participant's device.
///
/// The browser generates it once and keeps it in local storage, so the same
/// phone maps to the same participant across reconnects. It is opaque to the
/// controller: never parsed, only compared.
///
/// `#[serde(transparent)]` keeps it a plain JSON string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    /// Creates a device id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// What a participant is in the current session.
///
/// `Joined` and `Spectator` are the two pre-deal states: a device that
/// connected before the game started is `Joined` and will be dealt a role;
/// a device that connected mid-game watches as a `Spectator`. The remaining
/// seven variants are the dealt roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoleKind {
    Joined,
    Spectator,
    Wolf,
    Seer,
    Witch,
    Hunter,
    Guard,
    Idiot,
    Villager,
}

impl RoleKind {
    /// Returns `true` for the seven roles the dealer hands out.
    pub fn is_dealt(&self) -> bool {
        !matches!(self, Self::Joined | Self::Spectator)
    }

    /// Returns `true` for the wolf team.
    pub fn is_wolf(&self) -> bool {
        matches!(self, Self::Wolf)
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Joined => "Joined",
            Self::Spectator => "Spectator",
            Self::Wolf => "Wolf",
            Self::Seer => "Seer",
            Self::Witch => "Witch",
            Self::Hunter => "Hunter",
            Self::Guard => "Guard",
            Self::Idiot => "Idiot",
            Self::Villager => "Villager",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Phases and outcome
// ---------------------------------------------------------------------------

/// The phase the session is in.
///
/// ```text
/// Lobby → Countdown → [Guard] → Wolf → [Seer] → [Witch] → Day ─┐
///                        ↑                                     │
///                        └──────────── next round ─────────────┘
///                                 (any death) → GameOver
/// ```
///
/// Bracketed phases are still entered when nobody holds the role; they are
/// then paced out by the scheduler instead of waiting for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PhaseKind {
    Lobby,
    Countdown,
    Guard,
    Wolf,
    Seer,
    Witch,
    Day,
    GameOver,
}

impl PhaseKind {
    /// Returns `true` for the four night phases.
    pub fn is_night(&self) -> bool {
        matches!(self, Self::Guard | Self::Wolf | Self::Seer | Self::Witch)
    }

    /// The role that acts in this phase, if any.
    ///
    /// Day has no single acting role: any living participant may report
    /// the exile outcome.
    pub fn acting_role(&self) -> Option<RoleKind> {
        match self {
            Self::Guard => Some(RoleKind::Guard),
            Self::Wolf => Some(RoleKind::Wolf),
            Self::Seer => Some(RoleKind::Seer),
            Self::Witch => Some(RoleKind::Witch),
            _ => None,
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lobby => "Lobby",
            Self::Countdown => "Countdown",
            Self::Guard => "Guard",
            Self::Wolf => "Wolf",
            Self::Seer => "Seer",
            Self::Witch => "Witch",
            Self::Day => "Day",
            Self::GameOver => "GameOver",
        };
        f.write_str(name)
    }
}

/// Which team won. `None` until the session is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Winner {
    #[default]
    None,
    Humans,
    Wolves,
}

// ---------------------------------------------------------------------------
// Inbound actions
// ---------------------------------------------------------------------------

/// Every action a participant's device can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Connect,
    Restart,
    GuardProtect,
    WolfKill,
    SeerCheck,
    WitchHeal,
    WitchPoison,
    WitchSkip,
    ChampExile,
    HunterShoot,
}

/// One message from a participant.
///
/// `targetId` is an empty string when the action has no target (guard skip,
/// witch skip, exile abstain, declined hunter shot). Use [`target`](Self::target)
/// rather than reading the field directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundAction {
    pub device_id: DeviceId,
    pub action: ActionKind,
    #[serde(default)]
    pub target_id: String,
}

impl InboundAction {
    /// Builds an action with an optional target.
    pub fn new(device_id: DeviceId, action: ActionKind, target: Option<&DeviceId>) -> Self {
        Self {
            device_id,
            action,
            target_id: target.map(|t| t.0.clone()).unwrap_or_default(),
        }
    }

    /// The target as a device id, `None` for "no target".
    pub fn target(&self) -> Option<DeviceId> {
        if self.target_id.is_empty() {
            None
        } else {
            Some(DeviceId(self.target_id.clone()))
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound messages
// ---------------------------------------------------------------------------

/// A living participant a viewer may pick, with their seat number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEntry {
    pub id: DeviceId,
    pub index: u32,
}

/// One participant's personalised view of the session.
///
/// Rebuilt from scratch after every state change; the client renders it
/// without keeping any state of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub role: RoleKind,
    /// Seat number, 0 before dealing.
    pub index: u32,
    pub is_dead: bool,
    pub phase: PhaseKind,
    pub round: u32,
    pub is_phase_locked: bool,
    pub hunter_action_pending: bool,
    /// Who this viewer may act on right now. Empty when they have no choice.
    pub targets: Vec<TargetEntry>,
    /// Night report, only present during Day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_note: Option<String>,
    pub can_shoot: bool,
    pub idiot_revealed: bool,
    pub game_over: bool,
    pub winner: Winner,
    /// Whole seconds left in the start countdown, 0 when not counting.
    pub countdown: u32,
    pub is_starting: bool,
    pub waiting_for_players: bool,
    pub current_count: u32,
    pub target_count: u32,
    pub admin_approved: bool,
    pub voted_players: Vec<DeviceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_guarded_id: Option<DeviceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witch: Option<WitchView>,
}

/// Extra fields only the witch sees during the Witch phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WitchView {
    pub has_heal: bool,
    pub has_poison: bool,
    pub wolf_target_id: Option<DeviceId>,
    /// Seat of the wolves' target, 0 when they picked nobody.
    pub wolf_target_index: u32,
}

/// Messages pushed from the controller to a device.
///
/// Internally tagged so the client can switch on `type`:
/// `{"type":"update", ...}` or `{"type":"seerResult","role":"wolf"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outbound {
    /// A full view refresh.
    Update(ParticipantView),
    /// Private answer to a seer check.
    SeerResult { role: RoleKind },
}
