//! Room actor: the single control loop that owns the game.
//!
//! The actor runs in its own Tokio task and is the only thing that ever
//! touches the [`PhaseMachine`]. Connection handlers talk to it through an
//! mpsc channel, so concurrent actions from many phones are serialized
//! without a lock. Between commands the actor wakes on every pacer tick to
//! fire due waits, which is how timed transitions happen while nobody is
//! sending anything.

use std::collections::BTreeMap;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use wolfden_protocol::{ActionKind, DeviceId, InboundAction, Outbound, PhaseKind, Winner};
use wolfden_tick::{Pacer, PacerConfig};

use crate::collab::{CuePlayer, InputSample, StatusDisplay};
use crate::view::{self, StatusReport};
use crate::{GameConfig, GameError, PhaseMachine};

/// Capacity of the room's command channel.
const COMMAND_CHANNEL_SIZE: usize = 256;

/// Channel sender for delivering outbound messages to one device.
pub type ViewSender = mpsc::UnboundedSender<Outbound>;

/// Commands sent to the room actor through its channel.
pub(crate) enum RoomCommand {
    /// Register a device (if new) and bind its outbound channel.
    Connect {
        device_id: DeviceId,
        sender: ViewSender,
        reply: oneshot::Sender<()>,
    },

    /// Unbind a device's outbound channel. The participant stays.
    Disconnect {
        device_id: DeviceId,
        sender: ViewSender,
    },

    /// A participant action.
    Action { action: InboundAction },

    /// A reading from the lobby controls.
    Input { sample: InputSample },

    /// Request a snapshot of the room.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Stop the actor.
    Shutdown,
}

/// A coarse snapshot of the room for callers outside the actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub phase: PhaseKind,
    pub round: u32,
    /// Registered non-spectators.
    pub player_count: usize,
    pub target_count: usize,
    /// Devices with a bound outbound channel.
    pub connections: usize,
    pub over: bool,
    pub winner: Winner,
}

/// Handle to the running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Registers `device_id` and binds `sender` as its outbound channel.
    ///
    /// Resolves once the room has processed the connect, so the caller's
    /// channel already holds the first view.
    pub async fn connect(&self, device_id: DeviceId, sender: ViewSender) -> Result<(), GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Connect {
            device_id,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| GameError::Unavailable)
    }

    /// Unbinds `sender` if it is still the device's current channel.
    pub async fn disconnect(&self, device_id: DeviceId, sender: ViewSender) -> Result<(), GameError> {
        self.send(RoomCommand::Disconnect { device_id, sender }).await
    }

    /// Sends a participant action (fire-and-forget).
    pub async fn send_action(&self, action: InboundAction) -> Result<(), GameError> {
        self.send(RoomCommand::Action { action }).await
    }

    /// Sends a lobby control reading.
    pub async fn input(&self, sample: InputSample) -> Result<(), GameError> {
        self.send(RoomCommand::Input { sample }).await
    }

    /// Requests a snapshot of the room.
    pub async fn info(&self) -> Result<RoomInfo, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| GameError::Unavailable)
    }

    /// Tells the room to stop.
    pub async fn shutdown(&self) -> Result<(), GameError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), GameError> {
        self.sender.send(cmd).await.map_err(|_| GameError::Unavailable)
    }
}

/// The room's clock. Follows tokio's clock so paused-time tests work.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// The actor state. Runs inside a Tokio task.
struct RoomActor<C, S> {
    machine: PhaseMachine,
    cue: C,
    status: S,
    pacer: Pacer,
    receiver: mpsc::Receiver<RoomCommand>,
    /// Per-device outbound channels.
    senders: BTreeMap<DeviceId, ViewSender>,
    /// Views need a broadcast at the next flush.
    dirty: bool,
    last_countdown: u32,
    last_status: Option<StatusReport>,
}

impl<C: CuePlayer, S: StatusDisplay> RoomActor<C, S> {
    async fn run(mut self) {
        tracing::info!("room actor started");
        self.flush(now());

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(RoomCommand::Shutdown) | None => {
                        tracing::info!("room shutting down");
                        break;
                    }
                    Some(cmd) => {
                        let now = now();
                        self.handle_command(cmd, now);
                        self.flush(now);
                    }
                },
                _ = self.pacer.wait_for_tick() => {
                    let now = now();
                    if self.machine.tick(now, self.cue.is_busy()) {
                        self.dirty = true;
                    }
                    self.flush(now);
                    self.pacer.record_tick_end();
                }
            }
        }

        tracing::info!(ticks = self.pacer.tick_count(), "room actor stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand, now: Instant) {
        match cmd {
            RoomCommand::Connect {
                device_id,
                sender,
                reply,
            } => {
                let action = InboundAction::new(device_id.clone(), ActionKind::Connect, None);
                self.machine.handle(&action, now);
                tracing::info!(device = %device_id, "connection bound");
                self.senders.insert(device_id, sender);
                self.dirty = true;
                // The view goes out before the caller hears back.
                self.flush(now);
                let _ = reply.send(());
            }
            RoomCommand::Disconnect { device_id, sender } => {
                let current = self
                    .senders
                    .get(&device_id)
                    .is_some_and(|bound| bound.same_channel(&sender));
                if current {
                    self.senders.remove(&device_id);
                    tracing::info!(device = %device_id, "connection unbound");
                }
            }
            RoomCommand::Action { action } => {
                let outcome = self.machine.handle(&action, now);
                if outcome.changed {
                    self.dirty = true;
                }
                for (device, msg) in outcome.private {
                    self.send_to(&device, msg);
                }
            }
            RoomCommand::Input { sample } => {
                if self.machine.input(sample, now) {
                    self.dirty = true;
                }
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {}
        }
    }

    /// Plays queued cues, then pushes views and status if anything moved.
    fn flush(&mut self, now: Instant) {
        for request in self.machine.take_cues() {
            self.cue.play(request.cue, request.blocking);
        }

        let countdown = self.machine.countdown_secs(now);
        if countdown != self.last_countdown {
            self.last_countdown = countdown;
            self.dirty = true;
        }

        if self.dirty {
            self.dirty = false;
            let machine = &self.machine;
            self.senders.retain(|device, sender| {
                let view = view::project(machine, device, now);
                sender.send(Outbound::Update(view)).is_ok()
            });
        }

        let report = view::status(&self.machine, now);
        if self.last_status.as_ref() != Some(&report) {
            self.status.show(&report);
            self.last_status = Some(report);
        }
    }

    /// Sends to one device. Silently drops if its receiver is gone.
    fn send_to(&self, device: &DeviceId, msg: Outbound) {
        if let Some(sender) = self.senders.get(device) {
            let _ = sender.send(msg);
        }
    }

    fn info(&self) -> RoomInfo {
        let session = self.machine.session();
        RoomInfo {
            phase: session.phase,
            round: session.round,
            player_count: self.machine.registry().player_count(),
            target_count: session.target_count,
            connections: self.senders.len(),
            over: session.over,
            winner: session.winner,
        }
    }
}

/// Spawns the room actor and returns a handle to it.
///
/// Must be called from inside a Tokio runtime.
pub fn spawn_room<C: CuePlayer, S: StatusDisplay>(
    config: GameConfig,
    pacer: PacerConfig,
    cue: C,
    status: S,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

    let actor = RoomActor {
        machine: PhaseMachine::new(config),
        cue,
        status,
        pacer: Pacer::new(pacer),
        receiver: rx,
        senders: BTreeMap::new(),
        dirty: false,
        last_countdown: 0,
        last_status: None,
    };

    tokio::spawn(actor.run());

    RoomHandle { sender: tx }
}
