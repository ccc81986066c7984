//! `WolfdenServer` builder and accept loop.
//!
//! This is the entry point for running the controller. It ties together
//! all the layers: transport → protocol → room.

use std::sync::Arc;

use wolfden_protocol::{Codec, JsonCodec};
use wolfden_room::{CuePlayer, GameConfig, RoomHandle, StatusDisplay, spawn_room};
use wolfden_tick::PacerConfig;
use wolfden_transport::{Transport, WebSocketTransport};

use crate::WolfdenError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) room: RoomHandle,
    pub(crate) codec: C,
}

/// Builder for configuring and starting the server.
///
/// # Example
///
/// ```rust,ignore
/// use wolfden::prelude::*;
///
/// let server = WolfdenServer::builder()
///     .bind("0.0.0.0:8080")
///     .game_config(GameConfig::default())
///     .build(SilentCue, LogStatus)
///     .await?;
/// server.run().await
/// ```
pub struct WolfdenServerBuilder {
    bind_addr: String,
    game_config: GameConfig,
    pacer_config: PacerConfig,
}

impl WolfdenServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            game_config: GameConfig::default(),
            pacer_config: PacerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the game configuration.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Sets the control loop cadence.
    pub fn pacer_config(mut self, config: PacerConfig) -> Self {
        self.pacer_config = config;
        self
    }

    /// Binds the listener and spawns the room actor.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`; the phone client speaks
    /// nothing else.
    pub async fn build<P: CuePlayer, S: StatusDisplay>(
        self,
        cue: P,
        status: S,
    ) -> Result<WolfdenServer<JsonCodec>, WolfdenError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let room = spawn_room(self.game_config, self.pacer_config, cue, status);

        let state = Arc::new(ServerState {
            room,
            codec: JsonCodec,
        });

        Ok(WolfdenServer { transport, state })
    }
}

impl Default for WolfdenServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Wolfden server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct WolfdenServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl WolfdenServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> WolfdenServerBuilder {
        WolfdenServerBuilder::new()
    }
}

impl<C: Codec> WolfdenServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle to the room, for feeding lobby input from outside.
    pub fn room(&self) -> RoomHandle {
        self.state.room.clone()
    }

    /// Runs the accept loop.
    ///
    /// Spawns a handler task for each connected phone. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), WolfdenError> {
        tracing::info!("Wolfden server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
