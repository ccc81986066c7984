//! Error types for the game layer.
//!
//! Only configuration problems are errors. A participant acting out of turn,
//! a dead player voting, or a late timer are normal events the state machine
//! ignores; they never surface here.

use wolfden_session::SessionError;

/// Errors that can occur when setting up or addressing a game.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The requested seat count cannot hold the mandatory roles.
    #[error("{requested} seats cannot hold the {minimum} mandatory roles")]
    TooFewSeats { requested: usize, minimum: usize },

    /// Fewer devices are registered than seats to deal.
    #[error("{registered} participants registered, {needed} needed to deal")]
    NotEnoughParticipants { needed: usize, registered: usize },

    /// The registry rejected an operation.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The room's command channel is closed.
    #[error("room is unavailable")]
    Unavailable,
}
