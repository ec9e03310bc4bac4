//! Per-connection handshake: name announcement and welcome.

use std::time::Duration;

use broadside_protocol::{Codec, ServerMessage};
use broadside_session::{MessageChannel, SessionError};
use broadside_transport::Connection;

/// Reads the player's name and answers with `welcome`.
///
/// The first frame is the raw name, trimmed. An empty name (possible over
/// WebSocket; TCP skips blank lines) becomes `player-<seat + 1>`. Names are
/// not required to be unique.
pub(crate) async fn handshake<C, K>(
    channel: &MessageChannel<C, K>,
    index: usize,
    timeout: Option<Duration>,
) -> Result<String, SessionError>
where
    C: Connection,
    K: Codec,
{
    let announced = channel.receive_name(timeout).await?;
    let name = if announced.is_empty() {
        default_name(index)
    } else {
        announced
    };

    channel.send(&ServerMessage::welcome(&name)).await?;
    tracing::info!(conn = %channel.id(), index, player = %name, "player joined");
    Ok(name)
}

fn default_name(index: usize) -> String {
    format!("player-{}", index + 1)
}
