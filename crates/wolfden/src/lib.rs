//! # Wolfden
//!
//! Moderator box for a table game of Werewolf.
//!
//! Phones connect over WebSocket and send one small JSON action at a time.
//! A single room actor owns the game: it deals roles, paces the night
//! phases with narration cues, resolves deaths and pushes every phone a
//! freshly built view after each change.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wolfden::prelude::*;
//!
//! # async fn run() -> Result<(), WolfdenError> {
//! let server = WolfdenServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(SilentCue, LogStatus)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::WolfdenError;
pub use server::{WolfdenServer, WolfdenServerBuilder};

/// Re-exports of the most commonly used types.
pub mod prelude {
    pub use crate::{WolfdenError, WolfdenServer, WolfdenServerBuilder};

    pub use wolfden_protocol::{
        ActionKind, Codec, DeviceId, InboundAction, JsonCodec, Outbound, ParticipantView,
        PhaseKind, RoleKind, TargetEntry, WitchView, Winner,
    };
    pub use wolfden_room::{
        CuePlayer, CueTable, GameConfig, GameError, InputSample, LogStatus, PhaseMachine,
        RoomHandle, RoomInfo, SilentCue, StatusDisplay, StatusReport, spawn_room,
    };
    pub use wolfden_session::{Participant, Registry, SessionError};
    pub use wolfden_tick::{OverrunPolicy, PacerConfig};
    pub use wolfden_transport::{Connection, ConnectionId, Transport, TransportError};
}
