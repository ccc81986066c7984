//! The participant record.
//!
//! A participant is the registry's view of one phone: who it is, what role
//! it was dealt, where it sits and whether it is still in the game.

use wolfden_protocol::{DeviceId, RoleKind};

/// One registered device.
///
/// ## Lifecycle
///
/// ```text
/// connect ──→ Joined / Spectator ──(deal)──→ dealt role, seat 1..N
///                                                 │
///                                          alive ──(death)──→ dead
///                                                 │
///                    (reset) ←────────────────────┘  back to Joined
/// ```
///
/// Death is monotonic within a session: nothing in the registry revives a
/// participant except a full reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// The device's stable identifier.
    pub device_id: DeviceId,

    /// `Joined`/`Spectator` before dealing, the dealt role after.
    pub role: RoleKind,

    /// Seat number shown to everybody (1-based), 0 until dealt.
    pub seat: u32,

    /// Whether the participant is still in the game.
    pub alive: bool,
}

impl Participant {
    /// A freshly connected device.
    pub fn new(device_id: DeviceId, role: RoleKind) -> Self {
        Self {
            device_id,
            role,
            seat: 0,
            alive: true,
        }
    }

    /// Alive and holding a dealt role. Spectators and undealt devices are
    /// never "living players", whatever their `alive` bit says.
    pub fn is_living_player(&self) -> bool {
        self.alive && self.role.is_dealt()
    }
}
