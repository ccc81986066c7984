//! The phase state machine.
//!
//! [`PhaseMachine`] owns the whole game: the [`Session`] aggregate, the
//! identity [`Registry`], and the [`WaitScheduler`] holding every timed
//! transition. It is sans-I/O. Callers hand it participant actions, lobby
//! input samples and the current `Instant`; it hands back whether anything
//! changed, private messages to deliver, and a queue of audio cues to play.
//!
//! # Driving it
//!
//! ```ignore
//! let mut machine = PhaseMachine::new(GameConfig::default());
//! machine.handle(&action, Instant::now());
//! // every loop iteration:
//! machine.tick(Instant::now(), cue_player.is_busy());
//! for cue in machine.take_cues() {
//!     cue_player.play(cue.cue, cue.blocking);
//! }
//! ```
//!
//! # Illegal input
//!
//! An action for the wrong phase, from the wrong role, from a dead
//! participant, or while a lock is held is dropped with a `debug!` line. It
//! is never an error and never queued.

use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};
use wolfden_protocol::{
    ActionKind, DeviceId, InboundAction, Outbound, PhaseKind, RoleKind, Winner,
};
use wolfden_session::{Participant, Registration, Registry};
use wolfden_tick::WaitScheduler;

use crate::collab::InputSample;
use crate::night::{self, NightOutcome};
use crate::state::{PendingHunterShot, Session};
use crate::{GameConfig, dealer};

// ---------------------------------------------------------------------------
// Transitions and outputs
// ---------------------------------------------------------------------------

/// What a scheduled wait does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The lobby countdown ran out: start the first night.
    FinishCountdown,
    /// Play the phase's opening cue and unlock it (or start pacing it out).
    OpenPhase(PhaseKind),
    /// A phase without a living role holder has waited long enough.
    SkipRole(PhaseKind),
    /// The skipped phase's closing cue is done: move on.
    AdvanceAfterSkip(PhaseKind),
    /// The seer has seen the result long enough.
    SeerReveal,
    /// The daytime gunshot cue is done: start the next night.
    BeginNightAfterShot,
}

/// An audio cue the machine wants played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueRequest {
    pub cue: u16,
    /// The machine will wait for this cue to finish before moving on.
    pub blocking: bool,
}

/// The result of handling one participant action.
#[derive(Debug, Default)]
pub struct Outcome {
    /// The game state changed; every view needs a refresh.
    pub changed: bool,
    /// Messages for a single device only.
    pub private: Vec<(DeviceId, Outbound)>,
}

impl Outcome {
    fn refresh() -> Self {
        Self {
            changed: true,
            private: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// PhaseMachine
// ---------------------------------------------------------------------------

/// The game controller for the single running session.
pub struct PhaseMachine {
    config: GameConfig,
    session: Session,
    registry: Registry,
    waits: WaitScheduler<Transition>,
    rng: StdRng,
    cues: Vec<CueRequest>,
}

impl PhaseMachine {
    /// Creates a machine sitting in an empty lobby.
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let target_count = config.clamp_players(config.default_players);
        Self {
            waits: WaitScheduler::new(config.cue_timeout),
            session: Session::new(target_count),
            registry: Registry::new(),
            rng,
            cues: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn waits(&self) -> &WaitScheduler<Transition> {
        &self.waits
    }

    /// Drains the cues requested since the last call, in order.
    pub fn take_cues(&mut self) -> Vec<CueRequest> {
        std::mem::take(&mut self.cues)
    }

    /// Whole seconds left on the start countdown, rounded up. 0 when no
    /// countdown is running.
    pub fn countdown_secs(&self, now: Instant) -> u32 {
        self.waits
            .countdown_remaining(now)
            .map_or(0, |left| left.as_millis().div_ceil(1000) as u32)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// `true` if `device` may take the action of `phase` right now.
    fn may_act(&self, device: &DeviceId, phase: PhaseKind) -> bool {
        let s = &self.session;
        if s.phase != phase || s.locked || s.seer_pending || s.pending_shot.is_some() || s.over {
            return false;
        }
        match phase.acting_role() {
            Some(role) => self
                .registry
                .get(device)
                .is_some_and(|p| p.is_living_player() && p.role == role),
            None => {
                phase == PhaseKind::Day
                    && self.registry.is_living_player(device)
                    && !s.is_revealed_idiot(device)
            }
        }
    }

    /// Who `viewer` may pick right now. Empty whenever they cannot act.
    ///
    /// Always living participants other than the viewer. The guard also
    /// loses last night's pick, and a revealed idiot cannot be exiled twice.
    pub fn targets_for(&self, viewer: &DeviceId) -> Vec<&Participant> {
        let s = &self.session;
        let others = self.registry.living().filter(|p| &p.device_id != viewer);

        if s.is_pending_hunter(viewer) {
            return others.collect();
        }
        if !self.may_act(viewer, s.phase) {
            return Vec::new();
        }
        match s.phase {
            PhaseKind::Guard => {
                let last = s.round_state.last_guard_target.as_ref();
                others.filter(|p| Some(&p.device_id) != last).collect()
            }
            PhaseKind::Day => others.filter(|p| !s.is_revealed_idiot(&p.device_id)).collect(),
            PhaseKind::Wolf | PhaseKind::Seer | PhaseKind::Witch => others.collect(),
            _ => Vec::new(),
        }
    }

    fn is_target(&self, viewer: &DeviceId, target: &DeviceId) -> bool {
        self.targets_for(viewer).iter().any(|p| &p.device_id == target)
    }

    fn first_night_phase(&self) -> PhaseKind {
        if self.registry.has_living(RoleKind::Guard) {
            PhaseKind::Guard
        } else {
            PhaseKind::Wolf
        }
    }

    // -----------------------------------------------------------------------
    // Participant actions
    // -----------------------------------------------------------------------

    /// Applies one participant action.
    pub fn handle(&mut self, action: &InboundAction, now: Instant) -> Outcome {
        let device = &action.device_id;
        let target = action.target();

        if action.action == ActionKind::Connect {
            return self.connect(device, now);
        }
        if self.session.pending_shot.is_some() && action.action != ActionKind::HunterShoot {
            debug!(%device, action = ?action.action, "hunter shot pending, action ignored");
            return Outcome::default();
        }

        let mut private = Vec::new();
        let changed = match action.action {
            ActionKind::Connect => false,
            ActionKind::Restart => self.restart_vote(device, now),
            ActionKind::GuardProtect => self.guard_protect(device, target, now),
            ActionKind::WolfKill => self.wolf_kill(device, target, now),
            ActionKind::SeerCheck => match self.seer_check(device, target, now) {
                Some(role) => {
                    private.push((device.clone(), Outbound::SeerResult { role }));
                    true
                }
                None => false,
            },
            ActionKind::WitchHeal | ActionKind::WitchPoison | ActionKind::WitchSkip => {
                self.witch_act(device, action.action, target, now)
            }
            ActionKind::ChampExile => self.exile(device, target, now),
            ActionKind::HunterShoot => self.hunter_shoot(device, target, now),
        };

        if !changed {
            debug!(
                %device,
                action = ?action.action,
                phase = %self.session.phase,
                "illegal action ignored"
            );
        }
        Outcome { changed, private }
    }

    fn connect(&mut self, device: &DeviceId, now: Instant) -> Outcome {
        match self
            .registry
            .register(device.clone(), self.session.accepting_players())
        {
            Registration::New(_) => {
                self.try_start(now);
            }
            Registration::Known(role) => debug!(%device, %role, "participant reconnected"),
        }
        Outcome::refresh()
    }

    fn guard_protect(&mut self, device: &DeviceId, target: Option<DeviceId>, now: Instant) -> bool {
        if !self.may_act(device, PhaseKind::Guard) {
            return false;
        }
        if target.as_ref().is_some_and(|t| !self.is_target(device, t)) {
            return false;
        }

        info!(guard = %device, target = or_dash(&target), "guard chose");
        let round = &mut self.session.round_state;
        round.guard_target = target.clone();
        round.last_guard_target = target;
        self.close_and_enter(PhaseKind::Guard, PhaseKind::Wolf, now);
        true
    }

    fn wolf_kill(&mut self, device: &DeviceId, target: Option<DeviceId>, now: Instant) -> bool {
        let Some(target) = target else {
            return false;
        };
        if !self.may_act(device, PhaseKind::Wolf) || !self.is_target(device, &target) {
            return false;
        }

        info!(wolf = %device, %target, "wolves chose");
        self.session.round_state.wolf_target = Some(target);
        self.close_and_enter(PhaseKind::Wolf, PhaseKind::Seer, now);
        true
    }

    /// Returns the checked role, which only the seer gets to see.
    fn seer_check(
        &mut self,
        device: &DeviceId,
        target: Option<DeviceId>,
        now: Instant,
    ) -> Option<RoleKind> {
        let target = target?;
        if !self.may_act(device, PhaseKind::Seer) || !self.is_target(device, &target) {
            return None;
        }
        let role = self.registry.role_of(&target)?;

        info!(seer = %device, %target, "seer checked");
        self.session.seer_pending = true;
        self.waits
            .delay(now, self.config.seer_reveal_delay, Transition::SeerReveal);
        Some(role)
    }

    fn witch_act(
        &mut self,
        device: &DeviceId,
        kind: ActionKind,
        target: Option<DeviceId>,
        now: Instant,
    ) -> bool {
        if !self.may_act(device, PhaseKind::Witch) {
            return false;
        }

        match kind {
            ActionKind::WitchHeal => {
                let round = &mut self.session.round_state;
                if !round.witch_has_heal || round.wolf_target.is_none() {
                    return false;
                }
                round.witch_healed = true;
                round.witch_has_heal = false;
                info!(witch = %device, "witch healed");
            }
            ActionKind::WitchPoison => {
                let Some(target) = target else {
                    return false;
                };
                if !self.session.round_state.witch_has_poison || !self.is_target(device, &target) {
                    return false;
                }
                info!(witch = %device, %target, "witch poisoned");
                let round = &mut self.session.round_state;
                round.witch_poison_target = Some(target);
                round.witch_has_poison = false;
            }
            _ => info!(witch = %device, "witch passed"),
        }

        self.session.locked = true;
        self.play(self.config.cues.witch_close, true);
        self.finish_night(now);
        true
    }

    fn exile(&mut self, device: &DeviceId, target: Option<DeviceId>, now: Instant) -> bool {
        if !self.may_act(device, PhaseKind::Day) {
            return false;
        }
        let Some(target) = target else {
            info!(reporter = %device, "nobody exiled");
            self.begin_night(now);
            return true;
        };
        if !self.is_target(device, &target) {
            return false;
        }

        if self.session.idiot.as_ref() == Some(&target) && !self.session.idiot_revealed {
            info!(idiot = %target, "idiot revealed, exile cancelled");
            self.session.idiot_revealed = true;
            self.begin_night(now);
            return true;
        }

        info!(reporter = %device, exiled = %target, "participant exiled");
        self.kill(&target);
        self.session.locked = true;
        if self.check_win() {
            return true;
        }
        if self.session.hunter_armed && self.registry.role_of(&target) == Some(RoleKind::Hunter) {
            self.await_hunter(target, PhaseKind::Day);
        } else {
            self.begin_night(now);
        }
        true
    }

    fn hunter_shoot(&mut self, device: &DeviceId, target: Option<DeviceId>, now: Instant) -> bool {
        if !self.session.is_pending_hunter(device) {
            return false;
        }
        if target.as_ref().is_some_and(|t| !self.is_target(device, t)) {
            return false;
        }
        let Some(pending) = self.session.pending_shot.take() else {
            return false;
        };

        info!(hunter = %device, target = or_dash(&target), "hunter fired");
        // The night report stays with the night's own deaths.
        if let Some(victim) = &target {
            self.kill(victim);
        }
        self.session.hunter_armed = false;
        self.play(self.config.cues.hunter_shot, true);
        if self.check_win() {
            return true;
        }

        if pending.died_in == PhaseKind::Day {
            let cap = self.config.hunter_shot_cue_timeout;
            self.waits.supersede();
            self.session.locked = true;
            self.waits.cue(
                now,
                self.config.phase_settle.min(cap),
                cap,
                Transition::BeginNightAfterShot,
            );
        } else {
            self.enter_phase(PhaseKind::Day, now);
        }
        true
    }

    fn restart_vote(&mut self, device: &DeviceId, now: Instant) -> bool {
        let s = &self.session;
        if !s.over || !s.admin_approved || self.registry.get(device).is_none() {
            return false;
        }
        if !self.session.restart_votes.insert(device.clone()) {
            return false;
        }

        let votes = self.session.restart_votes.len();
        info!(%device, votes, needed = self.session.target_count, "restart vote");
        if votes >= self.session.target_count {
            self.reset(now);
        }
        true
    }

    // -----------------------------------------------------------------------
    // Lobby input
    // -----------------------------------------------------------------------

    /// Applies a presence input sample. Returns `true` if anything changed.
    pub fn input(&mut self, sample: InputSample, now: Instant) -> bool {
        match sample {
            InputSample::Axis(raw) => self.step_target(raw, now),
            InputSample::Press => match self.session.phase {
                PhaseKind::Lobby => {
                    info!(target_count = self.session.target_count, "lobby confirmed");
                    self.session.confirmed = true;
                    self.try_start(now);
                    true
                }
                PhaseKind::GameOver => {
                    if self.session.admin_approved {
                        return false;
                    }
                    info!("restart approved");
                    self.session.admin_approved = true;
                    self.session.restart_votes.clear();
                    true
                }
                _ => false,
            },
        }
    }

    fn step_target(&mut self, raw: i32, now: Instant) -> bool {
        if self.session.phase != PhaseKind::Lobby {
            return false;
        }
        let up = if raw > self.config.axis_high {
            true
        } else if raw < self.config.axis_low {
            false
        } else {
            return false;
        };
        let repeat = self.config.axis_repeat;
        if self
            .session
            .last_axis_step
            .is_some_and(|last| now.saturating_duration_since(last) < repeat)
        {
            return false;
        }
        self.session.last_axis_step = Some(now);

        let current = self.session.target_count;
        let next = if up {
            current + 1
        } else {
            current.saturating_sub(1)
        };
        let next = self.config.clamp_players(next);
        if next == current {
            return false;
        }
        debug!(from = current, to = next, "target count changed");
        self.session.target_count = next;
        self.try_start(now);
        true
    }

    /// Deals and starts the countdown once the lobby is confirmed and full.
    fn try_start(&mut self, now: Instant) -> bool {
        let s = &self.session;
        if s.phase != PhaseKind::Lobby
            || !s.confirmed
            || self.registry.player_count() < s.target_count
        {
            return false;
        }

        match dealer::deal(&mut self.registry, s.target_count, &mut self.rng) {
            Ok(deal) => {
                self.session.idiot = deal.idiot;
                self.session.phase = PhaseKind::Countdown;
                self.waits.supersede();
                self.waits
                    .countdown(now, self.config.countdown, Transition::FinishCountdown);
                info!(seats = deal.seats.len(), "countdown started");
                true
            }
            Err(err) => {
                warn!(%err, "cannot deal, lobby unconfirmed");
                self.session.confirmed = false;
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Scheduler
    // -----------------------------------------------------------------------

    /// Fires every wait that is due. Returns `true` if anything changed.
    ///
    /// Does nothing while a hunter shot is pending.
    pub fn tick(&mut self, now: Instant, cue_busy: bool) -> bool {
        let mut changed = false;
        while self.session.pending_shot.is_none() {
            let Some(fired) = self.waits.poll(now, cue_busy) else {
                break;
            };
            debug!(transition = ?fired.on_complete, epoch = %fired.epoch, "wait fired");
            self.apply(fired.on_complete, now);
            changed = true;
        }
        changed
    }

    fn apply(&mut self, transition: Transition, now: Instant) {
        match transition {
            Transition::FinishCountdown => {
                self.session.started = true;
                info!(players = self.registry.living().count(), "game started");
                self.play(self.config.cues.night_falls, true);
                self.enter_phase(self.first_night_phase(), now);
            }
            Transition::OpenPhase(phase) => self.open_phase(phase, now),
            Transition::SkipRole(phase) => {
                if let Some(cue) = self.config.cues.closing(phase) {
                    self.play(cue, true);
                }
                self.waits.cue(
                    now,
                    self.config.phase_settle,
                    self.config.cue_timeout,
                    Transition::AdvanceAfterSkip(phase),
                );
            }
            Transition::AdvanceAfterSkip(phase) => match phase {
                PhaseKind::Guard => self.enter_phase(PhaseKind::Wolf, now),
                PhaseKind::Wolf => self.enter_phase(PhaseKind::Seer, now),
                PhaseKind::Seer => self.enter_phase(PhaseKind::Witch, now),
                PhaseKind::Witch => self.finish_night(now),
                other => warn!(phase = %other, "skip fired for a phase without a role"),
            },
            Transition::SeerReveal => {
                self.session.seer_pending = false;
                self.close_and_enter(PhaseKind::Seer, PhaseKind::Witch, now);
            }
            Transition::BeginNightAfterShot => self.begin_night(now),
        }
    }

    // -----------------------------------------------------------------------
    // Phase plumbing
    // -----------------------------------------------------------------------

    /// Moves to `phase`, locked, and schedules its opening once the
    /// previous cue has finished.
    fn enter_phase(&mut self, phase: PhaseKind, now: Instant) {
        self.waits.supersede();
        self.session.phase = phase;
        self.session.locked = true;
        info!(%phase, round = self.session.round, "phase entered");
        self.waits.cue(
            now,
            self.config.phase_settle,
            self.config.cue_timeout,
            Transition::OpenPhase(phase),
        );
    }

    fn close_and_enter(&mut self, closing: PhaseKind, next: PhaseKind, now: Instant) {
        if let Some(cue) = self.config.cues.closing(closing) {
            self.play(cue, true);
        }
        self.enter_phase(next, now);
    }

    fn open_phase(&mut self, phase: PhaseKind, now: Instant) {
        if let Some(cue) = self.config.cues.opening(phase) {
            self.play(cue, false);
        }
        match phase.acting_role() {
            Some(role) if !self.registry.has_living(role) => {
                info!(%phase, %role, "no living role holder, pacing phase out");
                self.waits
                    .delay(now, self.config.skip_delay, Transition::SkipRole(phase));
            }
            _ => {
                self.session.locked = false;
                debug!(%phase, "phase open");
            }
        }
    }

    fn finish_night(&mut self, now: Instant) {
        let NightOutcome {
            deaths,
            hunter_triggered,
            hunter_disarmed,
        } = night::resolve(
            &self.session.round_state,
            &self.registry,
            self.session.hunter_armed,
        );

        for death in &deaths {
            self.kill(death);
        }
        if hunter_disarmed {
            info!("hunter poisoned, shot lost");
            self.session.hunter_armed = false;
        }
        info!(round = self.session.round, deaths = deaths.len(), "night resolved");

        let hunter = deaths
            .iter()
            .find(|d| self.registry.role_of(d) == Some(RoleKind::Hunter))
            .cloned();
        self.session.round_state.last_night_deaths = deaths;
        self.session.locked = true;

        if self.check_win() {
            return;
        }
        match hunter {
            Some(hunter) if hunter_triggered => self.await_hunter(hunter, PhaseKind::Witch),
            _ => self.enter_phase(PhaseKind::Day, now),
        }
    }

    fn begin_night(&mut self, now: Instant) {
        self.session.round_state.start_next_night();
        self.session.round += 1;
        self.play(self.config.cues.night_falls, true);
        self.enter_phase(self.first_night_phase(), now);
    }

    fn await_hunter(&mut self, hunter: DeviceId, died_in: PhaseKind) {
        info!(%hunter, phase = %died_in, "waiting for hunter shot");
        self.waits.supersede();
        self.session.locked = true;
        self.session.pending_shot = Some(PendingHunterShot { hunter, died_in });
        self.play(self.config.cues.hunter_prompt, false);
    }

    /// Declares a winner if one exists. Returns `true` once the game is over.
    fn check_win(&mut self) -> bool {
        if self.session.over {
            return true;
        }
        if !self.session.started {
            return false;
        }

        let wolves = self.registry.living().filter(|p| p.role.is_wolf()).count();
        let others = self.registry.living().count() - wolves;
        let winner = if wolves == 0 {
            Winner::Humans
        } else if wolves >= others {
            Winner::Wolves
        } else {
            return false;
        };

        let s = &mut self.session;
        s.over = true;
        s.winner = winner;
        s.phase = PhaseKind::GameOver;
        s.locked = true;
        s.seer_pending = false;
        s.pending_shot = None;
        s.admin_approved = false;
        self.waits.supersede();
        info!(?winner, round = self.session.round, wolves, others, "game over");
        if let Some(cue) = self.config.cues.victory(winner) {
            self.play(cue, false);
        }
        true
    }

    /// Starts a new session with the same participants and target count.
    fn reset(&mut self, now: Instant) {
        info!(target_count = self.session.target_count, "session reset");
        let target_count = self.session.target_count;
        self.waits.clear();
        self.registry.demote_all();
        self.session = Session::new(target_count);
        self.session.confirmed = true;
        self.try_start(now);
    }

    fn kill(&mut self, device: &DeviceId) {
        if let Err(err) = self.registry.kill(device) {
            warn!(%err, "kill skipped");
        }
    }

    fn play(&mut self, cue: u16, blocking: bool) {
        self.cues.push(CueRequest { cue, blocking });
    }
}

fn or_dash(target: &Option<DeviceId>) -> &str {
    target.as_ref().map_or("-", DeviceId::as_str)
}
