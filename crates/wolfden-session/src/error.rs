//! Error types for the identity registry.

use wolfden_protocol::DeviceId;

/// Errors that can occur when addressing participants.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No participant was ever registered under this device id.
    #[error("no participant registered for device {0}")]
    NotFound(DeviceId),
}
