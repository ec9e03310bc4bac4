//! In-memory players for battle tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use broadside_protocol::{Codec, Coordinate, JsonCodec, ServerMessage};
use broadside_session::{MessageChannel, Phase, Player, SessionState};
use broadside_transport::LineConnection;
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf, duplex,
};

pub type TestPlayer = Player<LineConnection<DuplexStream>>;

/// Upper bound on any single wait in these tests.
pub const WAIT: Duration = Duration::from_secs(5);

/// The client end of a player's connection.
pub struct Peer {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl Peer {
    pub async fn send_line(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    pub async fn set_boats(&mut self, cells: &[(u32, u32)]) {
        let coords: Vec<[u32; 2]> = cells.iter().map(|&(x, y)| [x, y]).collect();
        let line = format!(
            r#"{{"type":"setBoats","coords":{}}}"#,
            json_cells(&coords)
        );
        self.send_line(&line).await;
    }

    pub async fn attack(&mut self, x: u32, y: u32) {
        self.send_line(&format!(r#"{{"type":"attack","coordinates":[{x},{y}]}}"#))
            .await;
    }

    /// Reads and decodes the next server message.
    pub async fn next(&mut self) -> ServerMessage {
        let line = tokio::time::timeout(WAIT, self.lines.next_line())
            .await
            .expect("timed out waiting for server message")
            .unwrap()
            .expect("server closed the connection");
        JsonCodec.decode(line.as_bytes()).unwrap()
    }

    pub fn disconnect(self) {
        drop(self);
    }
}

fn json_cells(coords: &[[u32; 2]]) -> String {
    let cells: Vec<String> = coords.iter().map(|[x, y]| format!("[{x},{y}]")).collect();
    format!("[{}]", cells.join(","))
}

/// A player at `index` backed by an in-memory duplex pipe.
pub fn seat(index: usize, name: &str) -> (TestPlayer, Peer) {
    seat_with_timeout(index, name, None)
}

pub fn seat_with_timeout(
    index: usize,
    name: &str,
    read_timeout: Option<Duration>,
) -> (TestPlayer, Peer) {
    let (ours, theirs) = duplex(64 * 1024);
    let channel = MessageChannel::new(LineConnection::new(ours), JsonCodec)
        .with_read_timeout(read_timeout);
    let player = Player::new(index, name, Arc::new(channel));
    let (read, writer) = tokio::io::split(theirs);
    let peer = Peer {
        lines: BufReader::new(read).lines(),
        writer,
    };
    (player, peer)
}

/// A session already advanced to the Battle phase.
pub async fn battle_session() -> Arc<SessionState> {
    let session = Arc::new(SessionState::new());
    session.advance_phase(Phase::Setup).await.unwrap();
    session.advance_phase(Phase::Battle).await.unwrap();
    session
}

/// Ana at seat 0 with ships at (1,1) and (2,2); Beto at seat 1 with a
/// ship at (0,0).
pub fn ana_and_beto() -> ([TestPlayer; 2], Peer, Peer) {
    let (mut ana, ana_peer) = seat(0, "Ana");
    let (mut beto, beto_peer) = seat(1, "Beto");
    ana.place_ships([Coordinate::new(1, 1), Coordinate::new(2, 2)])
        .unwrap();
    beto.place_ships([Coordinate::new(0, 0)]).unwrap();
    ([ana, beto], ana_peer, beto_peer)
}
