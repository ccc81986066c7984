//! Scenario tests for the phase machine, driven with explicit instants.

use std::time::{Duration, Instant};

use wolfden_protocol::{ActionKind, DeviceId, InboundAction, Outbound, PhaseKind, RoleKind, Winner};
use wolfden_room::{GameConfig, InputSample, Outcome, PendingHunterShot, PhaseMachine, view};
use wolfden_tick::WaitKind;

const SETTLE: Duration = Duration::from_secs(2);
const SEER_DELAY: Duration = Duration::from_millis(5500);
const SKIP: Duration = Duration::from_secs(3);
const COUNTDOWN: Duration = Duration::from_secs(4);

// =========================================================================
// Harness
// =========================================================================

/// A machine plus a hand-driven clock.
struct Table {
    m: PhaseMachine,
    now: Instant,
}

impl Table {
    /// An empty lobby with a fixed dealer seed.
    fn lobby() -> Self {
        Self {
            m: PhaseMachine::new(GameConfig::seeded(2024)),
            now: Instant::now(),
        }
    }

    /// `n` players dealt in, countdown over, first night phase open.
    fn seated(n: usize) -> Self {
        let mut t = Self::lobby();
        for i in 0..n {
            t.connect(&format!("p{i}"));
        }
        t.size_lobby(n);
        t.m.input(InputSample::Press, t.now);
        assert_eq!(t.phase(), PhaseKind::Countdown);

        t.advance(COUNTDOWN);
        assert!(t.m.session().started);
        t.advance(SETTLE);
        assert!(t.is_open(), "first night phase should be open");
        t
    }

    fn connect(&mut self, id: &str) -> DeviceId {
        let device = DeviceId::new(id);
        self.act(&device, ActionKind::Connect, None);
        device
    }

    fn size_lobby(&mut self, n: usize) {
        while self.m.session().target_count < n {
            self.axis(4000);
        }
        while self.m.session().target_count > n {
            self.axis(0);
        }
    }

    fn axis(&mut self, raw: i32) -> bool {
        self.now += Duration::from_millis(250);
        self.m.input(InputSample::Axis(raw), self.now)
    }

    fn advance(&mut self, by: Duration) -> bool {
        self.now += by;
        self.m.tick(self.now, false)
    }

    fn advance_busy(&mut self, by: Duration) -> bool {
        self.now += by;
        self.m.tick(self.now, true)
    }

    fn act(&mut self, who: &DeviceId, kind: ActionKind, target: Option<&DeviceId>) -> Outcome {
        let action = InboundAction::new(who.clone(), kind, target);
        self.m.handle(&action, self.now)
    }

    fn phase(&self) -> PhaseKind {
        self.m.session().phase
    }

    fn round(&self) -> u32 {
        self.m.session().round
    }

    fn is_open(&self) -> bool {
        !self.m.session().locked
    }

    fn is_alive(&self, device: &DeviceId) -> bool {
        self.m.registry().get(device).is_some_and(|p| p.alive)
    }

    /// Living holders of `role`, in seat order.
    fn living(&self, role: RoleKind) -> Vec<DeviceId> {
        self.m
            .registry()
            .living_with(role)
            .map(|p| p.device_id.clone())
            .collect()
    }

    fn holder(&self, role: RoleKind) -> DeviceId {
        self.living(role)
            .into_iter()
            .next()
            .unwrap_or_else(|| panic!("no living {role}"))
    }

    fn target_ids(&self, viewer: &DeviceId) -> Vec<DeviceId> {
        self.m
            .targets_for(viewer)
            .into_iter()
            .map(|p| p.device_id.clone())
            .collect()
    }

    fn cues(&mut self) -> Vec<u16> {
        self.m.take_cues().into_iter().map(|c| c.cue).collect()
    }

    /// Plays a night in which the wolves kill `victim` and everyone else
    /// passes. Ends right after the Witch phase resolves.
    fn play_night(&mut self, victim: &DeviceId) {
        if self.phase() == PhaseKind::Guard {
            let guard = self.holder(RoleKind::Guard);
            assert!(self.act(&guard, ActionKind::GuardProtect, None).changed);
            self.advance(SETTLE);
        }

        assert_eq!(self.phase(), PhaseKind::Wolf);
        let wolf = self.holder(RoleKind::Wolf);
        assert!(self.act(&wolf, ActionKind::WolfKill, Some(victim)).changed);
        self.advance(SETTLE);

        match self.living(RoleKind::Seer).first() {
            Some(seer) => {
                assert!(self.act(seer, ActionKind::SeerCheck, Some(&wolf)).changed);
                self.advance(SEER_DELAY);
            }
            None => {
                self.advance(SKIP);
                self.advance(SETTLE);
            }
        }

        assert_eq!(self.phase(), PhaseKind::Witch);
        self.advance(SETTLE);
        match self.living(RoleKind::Witch).first() {
            Some(witch) => {
                assert!(self.act(witch, ActionKind::WitchSkip, None).changed);
            }
            None => {
                self.advance(SKIP);
                self.advance(SETTLE);
            }
        }
    }

    /// Opens Day and reports an abstention, starting the next night.
    fn abstain(&mut self) {
        self.advance(SETTLE);
        assert_eq!(self.phase(), PhaseKind::Day);
        let reporter = self.m.registry().living().next().map(|p| p.device_id.clone()).unwrap();
        assert!(self.act(&reporter, ActionKind::ChampExile, None).changed);
        self.advance(SETTLE);
    }
}

// =========================================================================
// Lobby
// =========================================================================

#[test]
fn test_lobby_waits_for_confirmation_and_players() {
    let mut t = Table::lobby();
    for i in 0..6 {
        t.connect(&format!("p{i}"));
    }
    t.m.input(InputSample::Press, t.now);
    assert_eq!(t.phase(), PhaseKind::Lobby, "6 of 7 registered");
    assert!(t.m.session().confirmed);

    t.connect("p6");
    assert_eq!(t.phase(), PhaseKind::Countdown);
    assert_eq!(t.m.countdown_secs(t.now), 4);
}

#[test]
fn test_axis_steps_within_bounds_and_respects_repeat_guard() {
    let mut t = Table::lobby();
    assert_eq!(t.m.session().target_count, 7);

    assert!(t.axis(4000));
    assert_eq!(t.m.session().target_count, 8);

    // Too soon after the previous step.
    t.now += Duration::from_millis(50);
    assert!(!t.m.input(InputSample::Axis(4000), t.now));
    assert_eq!(t.m.session().target_count, 8);

    // Dead zone.
    assert!(!t.axis(2000));

    for _ in 0..20 {
        t.axis(0);
    }
    assert_eq!(t.m.session().target_count, 6);
    for _ in 0..20 {
        t.axis(4095);
    }
    assert_eq!(t.m.session().target_count, 15);
}

#[test]
fn test_extra_players_are_benched_and_late_joiners_spectate() {
    let mut t = Table::lobby();
    for i in 0..8 {
        t.connect(&format!("p{i}"));
    }
    t.m.input(InputSample::Press, t.now);
    assert_eq!(t.phase(), PhaseKind::Countdown);
    assert_eq!(t.m.registry().role_of(&DeviceId::new("p7")), Some(RoleKind::Spectator));

    let late = t.connect("late");
    assert_eq!(t.m.registry().role_of(&late), Some(RoleKind::Spectator));
    assert!(t.target_ids(&late).is_empty());
}

#[test]
fn test_countdown_starts_first_night() {
    let mut t = Table::seated(7);
    assert_eq!(t.phase(), PhaseKind::Wolf, "no guard at 7 seats");
    assert_eq!(t.round(), 1);
    assert_eq!(t.cues(), vec![1, 2], "night falls, then wolves open");
}

#[test]
fn test_guard_table_opens_on_guard() {
    let t = Table::seated(10);
    assert_eq!(t.phase(), PhaseKind::Guard);
    assert_eq!(t.living(RoleKind::Wolf).len(), 3);
}

// =========================================================================
// Night actions
// =========================================================================

#[test]
fn test_actions_from_wrong_role_or_phase_are_ignored() {
    let mut t = Table::seated(7);
    let seer = t.holder(RoleKind::Seer);
    let villager = t.holder(RoleKind::Villager);

    assert!(!t.act(&seer, ActionKind::WolfKill, Some(&villager)).changed);
    assert!(!t.act(&seer, ActionKind::SeerCheck, Some(&villager)).changed);
    assert!(!t.act(&villager, ActionKind::ChampExile, Some(&seer)).changed);
    assert_eq!(t.phase(), PhaseKind::Wolf);
    assert!(t.m.session().round_state.wolf_target.is_none());
}

#[test]
fn test_wolves_need_a_living_target() {
    let mut t = Table::seated(7);
    let wolf = t.holder(RoleKind::Wolf);

    assert!(!t.act(&wolf, ActionKind::WolfKill, None).changed);
    assert!(!t.act(&wolf, ActionKind::WolfKill, Some(&wolf)).changed, "not self");
    assert!(!t.act(&wolf, ActionKind::WolfKill, Some(&DeviceId::new("ghost"))).changed);
    assert_eq!(t.phase(), PhaseKind::Wolf);
}

#[test]
fn test_phase_is_locked_until_opening_cue_settles() {
    let mut t = Table::seated(7);
    let wolf = t.holder(RoleKind::Wolf);
    let villager = t.holder(RoleKind::Villager);
    let seer = t.holder(RoleKind::Seer);

    t.act(&wolf, ActionKind::WolfKill, Some(&villager));
    assert_eq!(t.phase(), PhaseKind::Seer);
    assert!(!t.is_open());
    assert!(!t.act(&seer, ActionKind::SeerCheck, Some(&wolf)).changed);

    t.advance(SETTLE);
    assert!(t.is_open());
    assert!(t.act(&seer, ActionKind::SeerCheck, Some(&wolf)).changed);
}

#[test]
fn test_seer_gets_private_result_and_cannot_check_twice() {
    let mut t = Table::seated(7);
    let wolf = t.holder(RoleKind::Wolf);
    let seer = t.holder(RoleKind::Seer);
    let villager = t.holder(RoleKind::Villager);
    t.act(&wolf, ActionKind::WolfKill, Some(&villager));
    t.advance(SETTLE);

    let first = t.act(&seer, ActionKind::SeerCheck, Some(&wolf));
    assert_eq!(
        first.private,
        vec![(seer.clone(), Outbound::SeerResult { role: RoleKind::Wolf })]
    );

    let again = t.act(&seer, ActionKind::SeerCheck, Some(&villager));
    assert!(!again.changed);
    assert!(again.private.is_empty());

    // Reveal delay still running.
    t.advance(SEER_DELAY - Duration::from_millis(1));
    assert_eq!(t.phase(), PhaseKind::Seer);
    t.advance(Duration::from_millis(1));
    assert_eq!(t.phase(), PhaseKind::Witch);
}

#[test]
fn test_witch_heal_saves_and_is_spent() {
    let mut t = Table::seated(7);
    let wolf = t.holder(RoleKind::Wolf);
    let villager = t.holder(RoleKind::Villager);
    let seer = t.holder(RoleKind::Seer);
    let witch = t.holder(RoleKind::Witch);

    t.act(&wolf, ActionKind::WolfKill, Some(&villager));
    t.advance(SETTLE);
    t.act(&seer, ActionKind::SeerCheck, Some(&wolf));
    t.advance(SEER_DELAY);
    t.advance(SETTLE);

    let view = view::project(&t.m, &witch, t.now);
    let extras = view.witch.expect("witch sees her extras");
    assert_eq!(extras.wolf_target_id, Some(villager.clone()));
    assert_eq!(extras.wolf_target_index, t.m.registry().seat_of(&villager));
    assert!(extras.has_heal);

    assert!(t.act(&witch, ActionKind::WitchHeal, None).changed);
    assert!(t.is_alive(&villager));
    assert!(!t.m.session().round_state.witch_has_heal);
    assert_eq!(t.phase(), PhaseKind::Day);

    t.advance(SETTLE);
    let note = view::project(&t.m, &villager, t.now).death_note;
    assert_eq!(note.as_deref(), Some("Last night was peaceful."));
}

#[test]
fn test_guard_cannot_repeat_last_nights_pick() {
    let mut t = Table::seated(10);
    let guard = t.holder(RoleKind::Guard);
    let protected = t.holder(RoleKind::Villager);

    assert!(t.act(&guard, ActionKind::GuardProtect, Some(&protected)).changed);
    assert_eq!(t.m.session().round_state.last_guard_target, Some(protected.clone()));
    t.advance(SETTLE);

    // Wolves go for the guarded villager; nobody heals.
    let wolf = t.holder(RoleKind::Wolf);
    let seer = t.holder(RoleKind::Seer);
    let witch = t.holder(RoleKind::Witch);
    t.act(&wolf, ActionKind::WolfKill, Some(&protected));
    t.advance(SETTLE);
    t.act(&seer, ActionKind::SeerCheck, Some(&wolf));
    t.advance(SEER_DELAY);
    t.advance(SETTLE);
    t.act(&witch, ActionKind::WitchSkip, None);
    assert!(t.is_alive(&protected), "guard protection holds");

    t.abstain();
    assert_eq!(t.round(), 2);
    assert_eq!(t.phase(), PhaseKind::Guard);
    assert!(t.is_open());

    let targets = t.target_ids(&guard);
    assert!(!targets.is_empty());
    assert!(!targets.contains(&protected));
    assert!(!targets.contains(&guard));
    assert!(!t.act(&guard, ActionKind::GuardProtect, Some(&protected)).changed);

    let view = view::project(&t.m, &guard, t.now);
    assert_eq!(view.last_guarded_id, Some(protected));
}

#[test]
fn test_guard_and_heal_on_same_target_kills() {
    let mut t = Table::seated(10);
    let guard = t.holder(RoleKind::Guard);
    let wolf = t.holder(RoleKind::Wolf);
    let seer = t.holder(RoleKind::Seer);
    let witch = t.holder(RoleKind::Witch);
    let villager = t.holder(RoleKind::Villager);

    t.act(&guard, ActionKind::GuardProtect, Some(&villager));
    t.advance(SETTLE);
    t.act(&wolf, ActionKind::WolfKill, Some(&villager));
    t.advance(SETTLE);
    t.act(&seer, ActionKind::SeerCheck, Some(&wolf));
    t.advance(SEER_DELAY);
    t.advance(SETTLE);
    t.act(&witch, ActionKind::WitchHeal, None);

    assert!(!t.is_alive(&villager));
    assert_eq!(t.m.session().round_state.last_night_deaths, vec![villager]);
}

// =========================================================================
// Skipped roles
// =========================================================================

#[test]
fn test_phase_without_living_holder_is_paced_out() {
    let mut t = Table::seated(7);
    let seer = t.holder(RoleKind::Seer);
    t.play_night(&seer);
    t.abstain();
    assert_eq!(t.round(), 2);
    assert_eq!(t.phase(), PhaseKind::Wolf);

    let wolf = t.holder(RoleKind::Wolf);
    let villager = t.holder(RoleKind::Villager);
    t.act(&wolf, ActionKind::WolfKill, Some(&villager));
    t.cues();

    // Opening cue plays even though nobody will act.
    t.advance(SETTLE);
    assert_eq!(t.phase(), PhaseKind::Seer);
    assert!(!t.is_open());
    assert_eq!(t.cues(), vec![4]);

    t.advance(SKIP - Duration::from_millis(1));
    assert_eq!(t.cues(), Vec::<u16>::new());
    t.advance(Duration::from_millis(1));
    assert_eq!(t.cues(), vec![5], "closing cue after the skip delay");
    assert_eq!(t.phase(), PhaseKind::Seer);

    t.advance(SETTLE);
    assert_eq!(t.phase(), PhaseKind::Witch);
}

#[test]
fn test_skipped_witch_resolves_with_no_potions() {
    let mut t = Table::seated(7);
    let witch = t.holder(RoleKind::Witch);
    t.play_night(&witch);
    t.abstain();

    let villager = t.holder(RoleKind::Villager);
    t.play_night(&villager);
    assert_eq!(t.phase(), PhaseKind::Day);
    assert!(!t.is_alive(&villager));
    assert_eq!(t.m.session().round_state.last_night_deaths, vec![villager]);
}

#[test]
fn test_busy_cue_only_delays_up_to_the_cap() {
    let mut t = Table::seated(7);
    let wolf = t.holder(RoleKind::Wolf);
    let villager = t.holder(RoleKind::Villager);
    t.act(&wolf, ActionKind::WolfKill, Some(&villager));

    assert!(!t.advance_busy(SETTLE));
    assert!(!t.is_open());
    assert!(!t.advance_busy(Duration::from_millis(2999)));
    assert!(!t.is_open());
    assert!(t.advance_busy(Duration::from_millis(1)));
    assert!(t.is_open(), "gave up on the cue after 5 s");
}

// =========================================================================
// Hunter
// =========================================================================

#[test]
fn test_hunter_killed_at_night_blocks_day_until_shot() {
    let mut t = Table::seated(7);
    let hunter = t.holder(RoleKind::Hunter);
    let wolf = t.holder(RoleKind::Wolf);
    let villager = t.holder(RoleKind::Villager);
    t.play_night(&hunter);

    assert!(!t.is_alive(&hunter));
    assert_eq!(
        t.m.session().pending_shot,
        Some(PendingHunterShot {
            hunter: hunter.clone(),
            died_in: PhaseKind::Witch,
        })
    );
    assert_eq!(t.phase(), PhaseKind::Witch);
    assert!(view::project(&t.m, &hunter, t.now).can_shoot);
    assert!(view::project(&t.m, &villager, t.now).hunter_action_pending);

    // Nothing else moves the game.
    assert!(!t.act(&villager, ActionKind::ChampExile, Some(&wolf)).changed);
    assert!(!t.act(&wolf, ActionKind::WolfKill, Some(&villager)).changed);
    assert!(!t.act(&wolf, ActionKind::HunterShoot, Some(&villager)).changed);
    assert!(!t.advance(Duration::from_secs(30)));
    assert_eq!(t.phase(), PhaseKind::Witch);

    assert!(t.act(&hunter, ActionKind::HunterShoot, Some(&villager)).changed);
    assert!(t.m.session().pending_shot.is_none());
    assert!(!t.m.session().hunter_armed);
    assert!(!t.is_alive(&villager));
    assert_eq!(t.phase(), PhaseKind::Day);
    assert_eq!(t.round(), 1);

    t.advance(SETTLE);
    assert_eq!(
        t.m.session().round_state.last_night_deaths,
        vec![hunter.clone()],
        "the shot is not part of the night report"
    );
    let seat = t.m.registry().seat_of(&hunter);
    let note = view::project(&t.m, &wolf, t.now).death_note;
    assert_eq!(note, Some(format!("Died last night: seat {seat}.")));
}

#[test]
fn test_poisoned_hunter_never_gets_a_shot() {
    let mut t = Table::seated(7);
    let wolf = t.holder(RoleKind::Wolf);
    let seer = t.holder(RoleKind::Seer);
    let witch = t.holder(RoleKind::Witch);
    let hunter = t.holder(RoleKind::Hunter);
    let villager = t.holder(RoleKind::Villager);

    t.act(&wolf, ActionKind::WolfKill, Some(&villager));
    t.advance(SETTLE);
    t.act(&seer, ActionKind::SeerCheck, Some(&wolf));
    t.advance(SEER_DELAY);
    t.advance(SETTLE);
    assert!(t.act(&witch, ActionKind::WitchPoison, Some(&hunter)).changed);

    assert!(!t.is_alive(&hunter));
    assert!(t.m.session().pending_shot.is_none());
    assert!(!t.m.session().hunter_armed);
    assert_eq!(t.phase(), PhaseKind::Day);
}

#[test]
fn test_day_shot_does_not_advance_round_until_cue_finishes() {
    let mut t = Table::seated(7);
    let villager = t.holder(RoleKind::Villager);
    t.play_night(&villager);
    t.advance(SETTLE);
    assert_eq!(t.phase(), PhaseKind::Day);

    let hunter = t.holder(RoleKind::Hunter);
    let seer = t.holder(RoleKind::Seer);
    let wolf = t.holder(RoleKind::Wolf);
    assert!(t.act(&seer, ActionKind::ChampExile, Some(&hunter)).changed);
    assert_eq!(
        t.m.session().pending_shot.as_ref().map(|p| p.died_in),
        Some(PhaseKind::Day)
    );
    assert!(!t.advance(Duration::from_secs(10)));
    assert_eq!(t.round(), 1);

    assert!(t.act(&hunter, ActionKind::HunterShoot, Some(&wolf)).changed);
    assert!(!t.is_alive(&wolf));
    assert_eq!(t.phase(), PhaseKind::Day);
    assert_eq!(t.round(), 1, "no increment during the shot");

    // The gunshot cue is capped at 3.5 s even if the player stays busy.
    assert!(!t.advance_busy(Duration::from_millis(3499)));
    assert!(t.advance_busy(Duration::from_millis(1)));
    assert_eq!(t.round(), 2);
    assert_eq!(t.phase(), PhaseKind::Wolf);
    assert!(t.m.session().round_state.last_night_deaths.is_empty());
}

#[test]
fn test_hunter_may_decline_the_shot() {
    let mut t = Table::seated(7);
    let hunter = t.holder(RoleKind::Hunter);
    t.play_night(&hunter);
    let living_before = t.m.registry().living().count();

    assert!(t.act(&hunter, ActionKind::HunterShoot, None).changed);
    assert_eq!(t.m.registry().living().count(), living_before);
    assert_eq!(t.phase(), PhaseKind::Day);
}

// =========================================================================
// Idiot
// =========================================================================

#[test]
fn test_idiot_survives_first_exile_and_loses_the_vote() {
    let mut t = Table::seated(13);
    let first = t.holder(RoleKind::Villager);
    t.play_night(&first);
    t.advance(SETTLE);

    let idiot = t.holder(RoleKind::Idiot);
    let seer = t.holder(RoleKind::Seer);
    assert!(t.act(&seer, ActionKind::ChampExile, Some(&idiot)).changed);
    assert!(t.is_alive(&idiot));
    assert!(t.m.session().idiot_revealed);
    assert_eq!(t.round(), 2);
    assert!(view::project(&t.m, &idiot, t.now).idiot_revealed);
    assert!(!view::project(&t.m, &seer, t.now).idiot_revealed, "only the idiot is told");

    t.advance(SETTLE);
    let second = t.holder(RoleKind::Villager);
    t.play_night(&second);
    t.advance(SETTLE);
    assert_eq!(t.phase(), PhaseKind::Day);

    let wolf = t.holder(RoleKind::Wolf);
    let seer_view = view::project(&t.m, &seer, t.now);
    assert!(!seer_view.idiot_revealed);
    assert!(!seer_view.targets.is_empty(), "other players keep their vote");
    assert!(t.target_ids(&idiot).is_empty());
    assert!(!t.act(&idiot, ActionKind::ChampExile, Some(&wolf)).changed);
    assert!(!t.target_ids(&seer).contains(&idiot));
    assert!(!t.act(&seer, ActionKind::ChampExile, Some(&idiot)).changed);
    assert!(t.is_alive(&idiot));
}

// =========================================================================
// Victory and restart
// =========================================================================

/// Six seats: wolves kill a villager, the witch poisons one wolf, the day
/// exiles the other.
fn humans_win() -> Table {
    let mut t = Table::seated(6);
    let wolves = t.living(RoleKind::Wolf);
    let seer = t.holder(RoleKind::Seer);
    let witch = t.holder(RoleKind::Witch);
    let villager = t.holder(RoleKind::Villager);

    t.act(&wolves[0], ActionKind::WolfKill, Some(&villager));
    t.advance(SETTLE);
    t.act(&seer, ActionKind::SeerCheck, Some(&wolves[0]));
    t.advance(SEER_DELAY);
    t.advance(SETTLE);
    t.act(&witch, ActionKind::WitchPoison, Some(&wolves[0]));
    assert!(!t.m.session().over);
    t.advance(SETTLE);
    t.cues();

    assert!(t.act(&seer, ActionKind::ChampExile, Some(&wolves[1])).changed);
    t
}

#[test]
fn test_last_wolf_exiled_means_humans_win() {
    let mut t = humans_win();
    let session = t.m.session();
    assert!(session.over);
    assert_eq!(session.winner, Winner::Humans);
    assert_eq!(session.phase, PhaseKind::GameOver);
    assert_eq!(t.cues(), vec![20]);
}

#[test]
fn test_win_is_sticky() {
    let mut t = humans_win();
    let seer = t.holder(RoleKind::Seer);
    let villager = t.holder(RoleKind::Villager);

    assert!(!t.act(&seer, ActionKind::ChampExile, Some(&villager)).changed);
    assert!(!t.advance(Duration::from_secs(60)));
    assert_eq!(t.m.session().winner, Winner::Humans);
    assert_eq!(t.phase(), PhaseKind::GameOver);
    assert_eq!(t.cues(), vec![20], "victory cue plays once");
}

#[test]
fn test_wolves_win_on_parity() {
    let mut t = Table::seated(6);
    let villagers = t.living(RoleKind::Villager);
    let seer = t.holder(RoleKind::Seer);
    t.play_night(&villagers[0]);
    t.advance(SETTLE);
    // Two wolves against seer, witch and one villager; exiling the seer
    // leaves two against two.
    assert!(t.act(&villagers[1], ActionKind::ChampExile, Some(&seer)).changed);
    assert_eq!(t.m.session().winner, Winner::Wolves);
    assert!(t.cues().contains(&21));
}

#[test]
fn test_restart_needs_approval_then_quorum() {
    let mut t = humans_win();
    let players: Vec<DeviceId> = t.m.registry().iter().map(|p| p.device_id.clone()).collect();

    assert!(!t.act(&players[0], ActionKind::Restart, None).changed, "not approved yet");
    assert!(t.m.input(InputSample::Press, t.now));
    assert!(t.m.session().admin_approved);

    assert!(t.act(&players[0], ActionKind::Restart, None).changed);
    assert!(!t.act(&players[0], ActionKind::Restart, None).changed, "one vote each");
    assert_eq!(
        view::project(&t.m, &players[1], t.now).voted_players,
        vec![players[0].clone()]
    );

    for p in &players[1..] {
        t.act(p, ActionKind::Restart, None);
    }
    let session = t.m.session();
    assert!(!session.over);
    assert_eq!(session.winner, Winner::None);
    assert_eq!(session.phase, PhaseKind::Countdown);
    assert_eq!(session.round, 1);
    assert!(session.restart_votes.is_empty());
    assert_eq!(t.m.registry().living().count(), 6, "everyone dealt back in");
}

#[test]
fn test_second_approval_press_keeps_cast_votes() {
    let mut t = humans_win();
    let players: Vec<DeviceId> = t.m.registry().iter().map(|p| p.device_id.clone()).collect();

    assert!(t.m.input(InputSample::Press, t.now));
    for p in &players[..3] {
        assert!(t.act(p, ActionKind::Restart, None).changed);
    }

    assert!(!t.m.input(InputSample::Press, t.now), "already approved");
    assert!(t.m.session().admin_approved);
    assert_eq!(t.m.session().restart_votes.len(), 3);
    assert_eq!(view::project(&t.m, &players[0], t.now).voted_players.len(), 3);
}

// =========================================================================
// Stale waits
// =========================================================================

fn assert_no_live_wait(t: &Table) {
    for kind in [WaitKind::CueCompletion, WaitKind::FixedDelay, WaitKind::Countdown] {
        assert!(!t.m.waits().has_pending(kind), "{kind:?} still pending");
    }
}

#[test]
fn test_game_over_discards_outstanding_waits() {
    // Skipped witch: the night resolves from a scheduled wait and ends the game.
    let mut t = Table::seated(6);
    let wolves = t.living(RoleKind::Wolf);
    let witch = t.holder(RoleKind::Witch);
    t.play_night(&witch);
    t.abstain();
    assert_eq!(t.phase(), PhaseKind::Wolf, "two wolves against three");

    let seer = t.holder(RoleKind::Seer);
    assert!(t.act(&wolves[0], ActionKind::WolfKill, Some(&seer)).changed);
    t.advance(SETTLE);
    // The seer is alive until the night resolves, so the check goes through.
    assert!(t.act(&seer, ActionKind::SeerCheck, Some(&wolves[0])).changed);
    t.advance(SEER_DELAY);
    t.advance(SETTLE);
    assert_eq!(t.phase(), PhaseKind::Witch);
    assert!(t.m.waits().has_pending(WaitKind::FixedDelay), "witch is paced out");

    t.advance(SKIP);
    t.advance(SETTLE);
    assert_eq!(t.m.session().winner, Winner::Wolves);
    assert_no_live_wait(&t);

    let round = t.round();
    assert!(!t.advance(Duration::from_secs(60)));
    assert_eq!(t.phase(), PhaseKind::GameOver);
    assert_eq!(t.round(), round);
}

#[test]
fn test_hunter_prompt_discards_outstanding_waits() {
    let mut t = Table::seated(7);
    let villager = t.holder(RoleKind::Villager);
    t.play_night(&villager);
    t.advance(SETTLE);

    let hunter = t.holder(RoleKind::Hunter);
    let seer = t.holder(RoleKind::Seer);
    assert!(t.act(&seer, ActionKind::ChampExile, Some(&hunter)).changed);
    assert!(t.m.session().pending_shot.is_some());
    assert_no_live_wait(&t);

    assert!(!t.advance(Duration::from_secs(60)));
    assert_eq!(t.phase(), PhaseKind::Day);
    assert_eq!(t.round(), 1);
}
