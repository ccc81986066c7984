//! Werewolf game rules and the control loop for Wolfden.
//!
//! The game itself is a sans-I/O state machine; the room actor wraps it in
//! the one Tokio task that owns it.
//!
//! # Key types
//!
//! - [`PhaseMachine`]: phases, actions, night resolution, win detection
//! - [`RoomHandle`]: send commands to the running room actor
//! - [`GameConfig`]: seat bounds, pacing delays, the audio cue table
//! - [`CuePlayer`] / [`StatusDisplay`]: the external collaborators
//!
//! Supporting modules: [`dealer`] builds and deals role pools, [`night`]
//! resolves a night's choices into deaths, [`view`] projects per-device
//! views and the status line.

mod collab;
mod config;
pub mod dealer;
mod error;
mod machine;
pub mod night;
mod room;
mod state;
pub mod view;

pub use collab::{CuePlayer, InputSample, LogStatus, SilentCue, StatusDisplay};
pub use config::{CueTable, GameConfig};
pub use error::GameError;
pub use machine::{CueRequest, Outcome, PhaseMachine, Transition};
pub use room::{RoomHandle, RoomInfo, ViewSender, spawn_room};
pub use state::{PendingHunterShot, Session};
pub use view::StatusReport;
