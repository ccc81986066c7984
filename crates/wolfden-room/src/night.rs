//! Night resolution.
//!
//! Turns one night's choices into a list of deaths. This is a pure function
//! of [`RoundState`] plus the role lookup: it never touches the registry, the
//! caller applies the outcome.

use wolfden_protocol::{DeviceId, RoleKind};
use wolfden_session::Registry;

/// Everything chosen during the current night, plus the per-game potions
/// and the guard's memory of last night.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    pub guard_target: Option<DeviceId>,
    pub wolf_target: Option<DeviceId>,
    /// Whether the witch used her heal tonight.
    pub witch_healed: bool,
    pub witch_poison_target: Option<DeviceId>,
    /// One-shot for the whole game.
    pub witch_has_heal: bool,
    /// One-shot for the whole game.
    pub witch_has_poison: bool,
    /// Survives the round reset: the guard may not pick the same person
    /// two nights running.
    pub last_guard_target: Option<DeviceId>,
    /// Filled when the night resolves, reported during Day.
    pub last_night_deaths: Vec<DeviceId>,
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            guard_target: None,
            wolf_target: None,
            witch_healed: false,
            witch_poison_target: None,
            witch_has_heal: true,
            witch_has_poison: true,
            last_guard_target: None,
            last_night_deaths: Vec::new(),
        }
    }
}

impl RoundState {
    /// Clears tonight's choices ahead of the next night. Potions and the
    /// guard's memory carry over.
    pub fn start_next_night(&mut self) {
        self.guard_target = None;
        self.wolf_target = None;
        self.witch_healed = false;
        self.witch_poison_target = None;
        self.last_night_deaths.clear();
    }
}

/// What a night produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightOutcome {
    /// Who died, wolf kill first, without duplicates.
    pub deaths: Vec<DeviceId>,
    /// A hunter with a live shot is among the dead.
    pub hunter_triggered: bool,
    /// The hunter was poisoned and loses the shot for good.
    pub hunter_disarmed: bool,
}

/// Resolves the night.
///
/// Rules, in order:
/// 1. Healed: the wolf target dies only if the guard protected the same
///    person (a double save kills).
/// 2. Not healed: the wolf target dies unless the guard protected them.
/// 3. A poison target dies regardless of the guard.
/// 4. A poisoned hunter is disarmed even though they die.
///
/// `hunter_armed` is whether the hunter's shot is still available.
pub fn resolve(round: &RoundState, registry: &Registry, hunter_armed: bool) -> NightOutcome {
    let mut outcome = NightOutcome::default();

    if let Some(target) = &round.wolf_target {
        let guarded = round.guard_target.as_ref() == Some(target);
        if round.witch_healed == guarded {
            outcome.deaths.push(target.clone());
        }
    }

    if let Some(poisoned) = &round.witch_poison_target {
        if registry.role_of(poisoned) == Some(RoleKind::Hunter) {
            outcome.hunter_disarmed = true;
        }
        if !outcome.deaths.contains(poisoned) {
            outcome.deaths.push(poisoned.clone());
        }
    }

    outcome.hunter_triggered = hunter_armed
        && !outcome.hunter_disarmed
        && outcome
            .deaths
            .iter()
            .any(|d| registry.role_of(d) == Some(RoleKind::Hunter));

    outcome
}
