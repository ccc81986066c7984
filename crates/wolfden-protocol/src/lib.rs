//! Wire protocol for Wolfden.
//!
//! This crate defines what travels between the controller and the
//! participants' phones:
//!
//! - **Types** ([`InboundAction`], [`Outbound`], [`ParticipantView`], ...):
//!   the JSON shapes the browser client sends and renders.
//! - **Game vocabulary** ([`RoleKind`], [`PhaseKind`], [`Winner`]): closed
//!   enums shared by every layer above, so no game rule ever compares strings.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, text out.
//!
//! ```text
//! Transport (frames) → Protocol (InboundAction / Outbound) → Room (rules)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, decode_action};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ActionKind, DeviceId, InboundAction, Outbound, ParticipantView, PhaseKind,
    RoleKind, TargetEntry, WitchView, Winner,
};
