//! Runs the moderator box.
//!
//! `WOLFDEN_BIND` picks the listen address. Lobby input comes from stdin:
//! `+` raises the seat count, `-` lowers it, `ok` confirms.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use wolfden::prelude::*;

#[tokio::main]
async fn main() -> Result<(), WolfdenError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind = std::env::var("WOLFDEN_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = WolfdenServer::builder()
        .bind(&bind)
        .build(SilentCue, LogStatus)
        .await?;
    tracing::info!(addr = %server.local_addr().map_err(TransportError::AcceptFailed)?, "listening");

    tokio::spawn(read_console(server.room()));
    server.run().await
}

async fn read_console(room: RoomHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let sample = match line.trim() {
            "+" => InputSample::Axis(4095),
            "-" => InputSample::Axis(0),
            "ok" => InputSample::Press,
            other => {
                tracing::debug!(input = other, "unrecognised console input");
                continue;
            }
        };
        if room.input(sample).await.is_err() {
            break;
        }
    }
}
