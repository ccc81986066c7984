//! Participant identity for Wolfden.
//!
//! Phones identify themselves with a device id they generate once and keep.
//! This crate remembers every such device for the lifetime of the process:
//!
//! 1. **Registration**: the first `connect` from a device creates a
//!    [`Participant`] (`Joined` in the lobby, `Spectator` mid-game).
//! 2. **Dealing**: the room layer overwrites role and seat once per session.
//! 3. **Liveness**: deaths are recorded here and every "who is still
//!    playing" question is answered here.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)      ← deals roles, resolves deaths, asks liveness
//!     ↕
//! Registry (this crate)   ← device id → role, seat, alive
//!     ↕
//! Protocol Layer (below)  ← DeviceId, RoleKind
//! ```

mod error;
mod participant;
mod registry;

pub use error::SessionError;
pub use participant::Participant;
pub use registry::{Registration, Registry};
