//! The role dealer.
//!
//! Builds a role pool sized to the table, shuffles it, and hands roles and
//! seats out in registration order.

use rand::Rng;
use rand::seq::SliceRandom;
use wolfden_protocol::{DeviceId, RoleKind};
use wolfden_session::Registry;

use crate::GameError;

/// Two wolves, a seer and a witch are dealt at every table size.
pub const MANDATORY_ROLES: usize = 4;

/// The unshuffled role pool for a table of `seats`.
///
/// | seats | wolves | hunter | guard | idiot |
/// |-------|--------|--------|-------|-------|
/// | 6     | 2      |        |       |       |
/// | 7–8   | 2      | ✓      |       |       |
/// | 9     | 3      | ✓      |       |       |
/// | 10–11 | 3      | ✓      | ✓     |       |
/// | 12    | 4      | ✓      | ✓     |       |
/// | 13+   | 4      | ✓      | ✓     | ✓     |
///
/// Seer and witch are always present; villagers fill the rest.
/// Tables are clamped to 6..=15 by [`GameConfig`](crate::GameConfig);
/// below [`MANDATORY_ROLES`] seats the pool cannot be built at all.
pub fn role_pool(seats: usize) -> Result<Vec<RoleKind>, GameError> {
    if seats < MANDATORY_ROLES {
        return Err(GameError::TooFewSeats {
            requested: seats,
            minimum: MANDATORY_ROLES,
        });
    }

    let mut pool = vec![RoleKind::Wolf, RoleKind::Wolf, RoleKind::Seer, RoleKind::Witch];
    if seats >= 7 {
        pool.push(RoleKind::Hunter);
    }
    if seats >= 9 {
        pool.push(RoleKind::Wolf);
    }
    if seats >= 10 {
        pool.push(RoleKind::Guard);
    }
    if seats >= 12 {
        pool.push(RoleKind::Wolf);
    }
    if seats >= 13 {
        pool.push(RoleKind::Idiot);
    }
    pool.resize(seats, RoleKind::Villager);
    Ok(pool)
}

/// The result of a deal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deal {
    /// `(device, role, seat)` in seat order.
    pub seats: Vec<(DeviceId, RoleKind, u32)>,
    /// Who holds the idiot card, for exile resolution.
    pub idiot: Option<DeviceId>,
    /// Registered devices past the last seat; they watch as spectators.
    pub benched: Vec<DeviceId>,
}

/// Deals a fresh pool of `seats` roles to the registered participants.
///
/// The first `seats` non-spectators in registration order get seats
/// `1..=seats`; anyone registered after them is benched as a spectator.
/// Fails before touching the registry if the pool cannot be built or there
/// are not enough participants to fill it.
pub fn deal<R: Rng + ?Sized>(
    registry: &mut Registry,
    seats: usize,
    rng: &mut R,
) -> Result<Deal, GameError> {
    let mut pool = role_pool(seats)?;

    let candidates: Vec<DeviceId> = registry.candidates().cloned().collect();
    if candidates.len() < seats {
        return Err(GameError::NotEnoughParticipants {
            needed: seats,
            registered: candidates.len(),
        });
    }

    // `shuffle` is a Fisher–Yates pass over the whole slice.
    pool.shuffle(rng);

    let mut dealt = Vec::with_capacity(seats);
    let mut idiot = None;
    for ((device, role), seat) in candidates.iter().zip(pool).zip(1u32..) {
        registry.assign(device, role, seat)?;
        if role == RoleKind::Idiot {
            idiot = Some(device.clone());
        }
        dealt.push((device.clone(), role, seat));
    }

    let benched: Vec<DeviceId> = candidates[seats..].to_vec();
    for device in &benched {
        registry.assign(device, RoleKind::Spectator, 0)?;
    }

    tracing::info!(seats, benched = benched.len(), "roles dealt");
    Ok(Deal {
        seats: dealt,
        idiot,
        benched,
    })
}
