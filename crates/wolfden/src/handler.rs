//! Per-connection handler: bind a device, then route frames both ways.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Wait for a `connect` action → bind the connection to its device id
//!   2. Loop: decoded actions go to the room, room messages go out as text
//!
//! Frames that fail to decode and actions sent before `connect` are
//! dropped; the phone simply sees no change in its view.

use std::sync::Arc;

use tokio::sync::mpsc;
use wolfden_protocol::{ActionKind, Codec, DeviceId, Outbound, decode_action};
use wolfden_room::{RoomHandle, ViewSender};
use wolfden_transport::{Connection, WebSocketConnection};

use crate::WolfdenError;
use crate::server::ServerState;

/// Drop guard that unbinds the device's channel when the handler exits.
///
/// Since `Drop` is synchronous, it spawns a fire-and-forget task.
struct BindingGuard {
    room: RoomHandle,
    device_id: DeviceId,
    sender: ViewSender,
}

impl Drop for BindingGuard {
    fn drop(&mut self) {
        let room = self.room.clone();
        let device_id = self.device_id.clone();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let _ = room.disconnect(device_id, sender).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), WolfdenError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();
    let mut binding: Option<BindingGuard> = None;

    loop {
        tokio::select! {
            frame = conn.recv() => {
                let data = match frame {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                };

                let action = match decode_action(&state.codec, &data) {
                    Ok(action) => action,
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "failed to decode action");
                        continue;
                    }
                };

                match &binding {
                    None if action.action == ActionKind::Connect => {
                        state.room.connect(action.device_id.clone(), tx.clone()).await?;
                        tracing::info!(%conn_id, device = %action.device_id, "device connected");
                        binding = Some(BindingGuard {
                            room: state.room.clone(),
                            device_id: action.device_id,
                            sender: tx.clone(),
                        });
                    }
                    None => {
                        tracing::debug!(%conn_id, action = ?action.action, "action before connect, ignoring");
                    }
                    Some(bound) if bound.device_id != action.device_id => {
                        tracing::warn!(
                            %conn_id,
                            bound = %bound.device_id,
                            claimed = %action.device_id,
                            "device id mismatch, ignoring"
                        );
                    }
                    Some(_) if action.action == ActionKind::Connect => {
                        // A repeated connect just refreshes the view.
                        state.room.connect(action.device_id, tx.clone()).await?;
                    }
                    Some(_) => state.room.send_action(action).await?,
                }
            }
            Some(msg) = rx.recv() => {
                let text = state.codec.encode(&msg)?;
                conn.send_text(&text).await?;
            }
        }
    }

    // binding drops here → channel unbound, participant kept.
    Ok(())
}
