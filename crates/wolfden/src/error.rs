//! Unified error type for Wolfden.

use wolfden_protocol::ProtocolError;
use wolfden_room::GameError;
use wolfden_session::SessionError;
use wolfden_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WolfdenError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A game error (configuration, room unavailable).
    #[error(transparent)]
    Game(#[from] GameError),
}
