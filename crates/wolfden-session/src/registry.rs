//! The identity registry: every device the controller has ever seen.
//!
//! Registration order matters. The dealer hands out roles and seats in the
//! order devices first connected, so participants live in a `Vec` rather
//! than a hash map. Sessions top out at fifteen players, so the linear
//! scans below are cheaper than keeping an index in sync.

use wolfden_protocol::{DeviceId, RoleKind};

use crate::{Participant, SessionError};

/// What happened when a device announced itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// First time this device was seen; it was registered with this role.
    New(RoleKind),
    /// The device was already registered (page reload, reconnect).
    Known(RoleKind),
}

/// Maps device ids to participants and tracks who is still alive.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    participants: Vec<Participant>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device if it is new.
    ///
    /// New devices become `Joined` while the lobby is still open
    /// (`accepting_players`) and `Spectator` otherwise. Known devices keep
    /// whatever role and liveness they already have.
    pub fn register(&mut self, device_id: DeviceId, accepting_players: bool) -> Registration {
        if let Some(existing) = self.get(&device_id) {
            return Registration::Known(existing.role);
        }

        let role = if accepting_players {
            RoleKind::Joined
        } else {
            RoleKind::Spectator
        };
        tracing::info!(device = %device_id, %role, "participant registered");
        self.participants.push(Participant::new(device_id, role));
        Registration::New(role)
    }

    /// Looks up a participant.
    pub fn get(&self, device_id: &DeviceId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.device_id == device_id)
    }

    fn get_mut(&mut self, device_id: &DeviceId) -> Result<&mut Participant, SessionError> {
        self.participants
            .iter_mut()
            .find(|p| &p.device_id == device_id)
            .ok_or_else(|| SessionError::NotFound(device_id.clone()))
    }

    /// The participant's role, `None` for unknown devices.
    pub fn role_of(&self, device_id: &DeviceId) -> Option<RoleKind> {
        self.get(device_id).map(|p| p.role)
    }

    /// The participant's seat, 0 for unknown or undealt devices.
    pub fn seat_of(&self, device_id: &DeviceId) -> u32 {
        self.get(device_id).map_or(0, |p| p.seat)
    }

    /// `true` if the device holds a dealt role and is still alive.
    pub fn is_living_player(&self, device_id: &DeviceId) -> bool {
        self.get(device_id).is_some_and(Participant::is_living_player)
    }

    /// Marks a participant dead.
    ///
    /// Returns `Ok(true)` if this call killed them and `Ok(false)` if they
    /// were already dead. Death is one-way.
    pub fn kill(&mut self, device_id: &DeviceId) -> Result<bool, SessionError> {
        let participant = self.get_mut(device_id)?;
        if !participant.alive {
            return Ok(false);
        }
        participant.alive = false;
        tracing::info!(
            device = %device_id,
            role = %participant.role,
            seat = participant.seat,
            "participant died"
        );
        Ok(true)
    }

    /// Overwrites a participant's role and seat (dealing).
    pub fn assign(
        &mut self,
        device_id: &DeviceId,
        role: RoleKind,
        seat: u32,
    ) -> Result<(), SessionError> {
        let participant = self.get_mut(device_id)?;
        participant.role = role;
        participant.seat = seat;
        participant.alive = true;
        Ok(())
    }

    /// Every participant still in the game, in registration order.
    pub fn living(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_living_player())
    }

    /// Living holders of one role.
    pub fn living_with(&self, role: RoleKind) -> impl Iterator<Item = &Participant> {
        self.living().filter(move |p| p.role == role)
    }

    /// `true` if at least one living participant holds `role`.
    pub fn has_living(&self, role: RoleKind) -> bool {
        self.living_with(role).next().is_some()
    }

    /// Devices eligible for dealing: everybody except spectators, in
    /// registration order.
    pub fn candidates(&self) -> impl Iterator<Item = &DeviceId> {
        self.participants
            .iter()
            .filter(|p| p.role != RoleKind::Spectator)
            .map(|p| &p.device_id)
    }

    /// Number of registered non-spectators (the lobby's "joined" counter).
    pub fn player_count(&self) -> usize {
        self.candidates().count()
    }

    /// Resets every participant to an undealt, living `Joined` entry.
    ///
    /// Used between sessions: identities survive, roles and deaths do not.
    pub fn demote_all(&mut self) {
        for participant in &mut self.participants {
            participant.role = RoleKind::Joined;
            participant.seat = 0;
            participant.alive = true;
        }
    }

    /// Every registered participant, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    /// Total number of registered devices, spectators included.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// `true` if no device ever registered.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
