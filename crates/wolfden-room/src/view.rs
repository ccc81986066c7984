//! Projections of the game state.
//!
//! Pure functions over a [`PhaseMachine`]: they read, never mutate. The room
//! actor calls them after every change.

use std::time::Instant;

use wolfden_protocol::{
    DeviceId, ParticipantView, PhaseKind, RoleKind, TargetEntry, Winner, WitchView,
};

use crate::PhaseMachine;

/// Builds `viewer`'s personalised view.
pub fn project(machine: &PhaseMachine, viewer: &DeviceId, now: Instant) -> ParticipantView {
    let session = machine.session();
    let registry = machine.registry();
    let participant = registry.get(viewer);
    let role = participant.map_or(RoleKind::Spectator, |p| p.role);
    let round = &session.round_state;

    let targets = machine
        .targets_for(viewer)
        .into_iter()
        .map(|p| TargetEntry {
            id: p.device_id.clone(),
            index: p.seat,
        })
        .collect();

    let death_note = (session.started && session.phase == PhaseKind::Day)
        .then(|| death_note(machine, &round.last_night_deaths));

    let last_guarded_id = (role == RoleKind::Guard && session.phase == PhaseKind::Guard)
        .then(|| round.last_guard_target.clone())
        .flatten();

    let witch = (role == RoleKind::Witch && session.phase == PhaseKind::Witch).then(|| WitchView {
        has_heal: round.witch_has_heal,
        has_poison: round.witch_has_poison,
        wolf_target_id: round.wolf_target.clone(),
        wolf_target_index: round.wolf_target.as_ref().map_or(0, |t| registry.seat_of(t)),
    });

    let voted_players = if session.admin_approved {
        session.restart_votes.iter().cloned().collect()
    } else {
        Vec::new()
    };

    ParticipantView {
        role,
        index: participant.map_or(0, |p| p.seat),
        is_dead: participant.is_some_and(|p| p.role.is_dealt() && !p.alive),
        phase: session.phase,
        round: session.round,
        is_phase_locked: session.locked || session.seer_pending || session.pending_shot.is_some(),
        hunter_action_pending: session.pending_shot.is_some(),
        targets,
        death_note,
        can_shoot: session.is_pending_hunter(viewer),
        idiot_revealed: session.is_revealed_idiot(viewer),
        game_over: session.over,
        winner: session.winner,
        countdown: machine.countdown_secs(now),
        is_starting: session.phase == PhaseKind::Countdown,
        waiting_for_players: session.phase == PhaseKind::Lobby,
        current_count: registry.player_count() as u32,
        target_count: session.target_count as u32,
        admin_approved: session.admin_approved,
        voted_players,
        last_guarded_id,
        witch,
    }
}

/// The Day report of who died overnight, by seat.
fn death_note(machine: &PhaseMachine, deaths: &[DeviceId]) -> String {
    if deaths.is_empty() {
        return "Last night was peaceful.".to_string();
    }
    let seats: Vec<String> = deaths
        .iter()
        .map(|d| format!("seat {}", machine.registry().seat_of(d)))
        .collect();
    format!("Died last night: {}.", seats.join(", "))
}

// ---------------------------------------------------------------------------
// Local status
// ---------------------------------------------------------------------------

/// The coarse line shown on the controller's own display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub label: &'static str,
    pub round: u32,
    pub current_count: usize,
    pub target_count: usize,
    pub votes: usize,
    pub countdown: u32,
    pub winner: Winner,
}

/// Builds the status report.
pub fn status(machine: &PhaseMachine, now: Instant) -> StatusReport {
    let session = machine.session();
    let label = match session.phase {
        PhaseKind::Lobby if session.confirmed => "WAITING JOIN",
        PhaseKind::Lobby => "SET PLAYER",
        PhaseKind::Countdown => "READYING",
        PhaseKind::Guard => "GUARD ACTING",
        PhaseKind::Wolf => "WOLF ACTING",
        PhaseKind::Seer => "SEER ACTING",
        PhaseKind::Witch => "WITCH ACTING",
        PhaseKind::Day => "VOTING TIME",
        PhaseKind::GameOver => "GAME OVER",
    };
    StatusReport {
        label,
        round: session.round,
        current_count: machine.registry().player_count(),
        target_count: session.target_count,
        votes: session.restart_votes.len(),
        countdown: machine.countdown_secs(now),
        winner: session.winner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameConfig, InputSample};
    use wolfden_protocol::{ActionKind, InboundAction};

    fn dev(i: usize) -> DeviceId {
        DeviceId::new(format!("p{i}"))
    }

    fn lobby(n: usize) -> (PhaseMachine, Instant) {
        let now = Instant::now();
        let mut m = PhaseMachine::new(GameConfig::seeded(11));
        for i in 0..n {
            m.handle(&InboundAction::new(dev(i), ActionKind::Connect, None), now);
        }
        (m, now)
    }

    #[test]
    fn test_lobby_view_counts() {
        let (m, now) = lobby(3);
        let view = project(&m, &dev(0), now);
        assert_eq!(view.role, RoleKind::Joined);
        assert_eq!(view.phase, PhaseKind::Lobby);
        assert!(view.waiting_for_players);
        assert_eq!(view.current_count, 3);
        assert_eq!(view.target_count, 7);
        assert!(view.targets.is_empty());
        assert!(view.death_note.is_none());
        assert!(view.witch.is_none());
    }

    #[test]
    fn test_unknown_viewer_is_spectator() {
        let (m, now) = lobby(1);
        let view = project(&m, &DeviceId::new("stranger"), now);
        assert_eq!(view.role, RoleKind::Spectator);
        assert_eq!(view.index, 0);
        assert!(!view.is_dead);
    }

    #[test]
    fn test_countdown_rounds_up_to_whole_seconds() {
        let (mut m, now) = lobby(7);
        m.input(InputSample::Press, now);
        let view = project(&m, &dev(0), now);
        assert!(view.is_starting);
        assert_eq!(view.countdown, 4);
        assert!(view.index >= 1);

        let later = now + std::time::Duration::from_millis(2500);
        assert_eq!(project(&m, &dev(0), later).countdown, 2);
    }

    #[test]
    fn test_status_labels_follow_lobby() {
        let (mut m, now) = lobby(2);
        assert_eq!(status(&m, now).label, "SET PLAYER");
        m.input(InputSample::Press, now);
        assert_eq!(status(&m, now).label, "WAITING JOIN");
        for i in 2..7 {
            m.handle(&InboundAction::new(dev(i), ActionKind::Connect, None), now);
        }
        let report = status(&m, now);
        assert_eq!(report.label, "READYING");
        assert_eq!(report.current_count, 7);
        assert_eq!(report.countdown, 4);
    }
}
