//! Core protocol types for Broadside's wire format.
//!
//! Every record is a JSON object with a `type` discriminator, e.g.
//! `{"type":"attack","coordinates":[3,5]}`. Field names are camelCase to
//! match the clients already speaking this protocol.
//!
//! The whole vocabulary, by direction:
//!
//! | Direction | `type` | Fields |
//! |---|---|---|
//! | client → server | `setBoats` | `coords: [[x, y], ..]` |
//! | client → server | `attack` | `coordinates: [x, y]` |
//! | server → client | `welcome` | `message` |
//! | server → client | `startBattle` | `message` |
//! | server → client | `turnNotification` | `yourTurn`, `message` |
//! | server → client | `updateAttackCoords` | `coordinates`, `hit` |
//! | server → client | `attacked` | `coordinates`, `hit`, `message` |
//! | server → client | `gameOver` | `message` |
//!
//! The player's name is the one frame that is not JSON: it is read raw,
//! before any of the above.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Side length of the board. The server does not bounds-check
/// coordinates against it; clients are trusted to stay on the grid.
pub const BOARD_SIZE: u32 = 10;

// ---------------------------------------------------------------------------
// Coordinate
// ---------------------------------------------------------------------------

/// A cell on the board, `(x, y)`.
///
/// A tuple struct so serde represents it as a two-element array, `[x, y]`,
/// which is how clients write coordinates. Negative numbers fail to decode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coordinate(pub u32, pub u32);

impl Coordinate {
    /// Creates a coordinate from its column and row.
    pub fn new(x: u32, y: u32) -> Self {
        Self(x, y)
    }

    pub fn x(&self) -> u32 {
        self.0
    }

    pub fn y(&self) -> u32 {
        self.1
    }
}

impl From<(u32, u32)> for Coordinate {
    fn from((x, y): (u32, u32)) -> Self {
        Self(x, y)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x(), self.y())
    }
}

// ---------------------------------------------------------------------------
// ClientMessage — player → server
// ---------------------------------------------------------------------------

/// Messages a player sends once it has announced its name.
///
/// The name itself is a raw frame, not a `ClientMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Ship placement. Sent once, during setup.
    SetBoats { coords: Vec<Coordinate> },

    /// An attack on the opponent's board. Only read from the active
    /// player during battle.
    Attack { coordinates: Coordinate },
}

impl ClientMessage {
    /// The wire `type` tag, for log lines and error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetBoats { .. } => "setBoats",
            Self::Attack { .. } => "attack",
        }
    }
}

// ---------------------------------------------------------------------------
// ServerMessage — server → player
// ---------------------------------------------------------------------------

/// Messages the server sends to players. None of them expects an
/// acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Sent right after the name announcement.
    Welcome { message: String },

    /// Both players have placed their ships.
    StartBattle { message: String },

    /// Sent to both players at the start of every turn.
    TurnNotification { your_turn: bool, message: String },

    /// Result of the receiver's own attack.
    UpdateAttackCoords { coordinates: Coordinate, hit: bool },

    /// The opponent attacked the receiver's board.
    Attacked {
        coordinates: Coordinate,
        hit: bool,
        message: String,
    },

    /// The session is over because the other player is gone.
    GameOver { message: String },
}

impl ServerMessage {
    pub fn welcome(name: &str) -> Self {
        Self::Welcome {
            message: format!(
                "Welcome, {name}. Place your ships by sending a 'setBoats' \
                 message with your coordinates."
            ),
        }
    }

    pub fn start_battle() -> Self {
        Self::StartBattle {
            message: "Both players have placed their ships. The battle begins!".into(),
        }
    }

    pub fn turn_notification(your_turn: bool) -> Self {
        let message = if your_turn {
            r#"Your turn. Send attack coordinates, e.g. {"type": "attack", "coordinates": [3,5]}"#
        } else {
            "Wait for your turn. The enemy is attacking..."
        };
        Self::TurnNotification {
            your_turn,
            message: message.into(),
        }
    }

    /// The attacker's view of a resolved attack.
    pub fn attack_result(coordinates: Coordinate, hit: bool) -> Self {
        Self::UpdateAttackCoords { coordinates, hit }
    }

    /// The defender's view of a resolved attack.
    pub fn attacked(coordinates: Coordinate, hit: bool) -> Self {
        let outcome = if hit { "hit you" } else { "missed" };
        Self::Attacked {
            coordinates,
            hit,
            message: format!("The enemy attacked {coordinates} and {outcome}."),
        }
    }

    pub fn game_over(reason: impl Into<String>) -> Self {
        Self::GameOver {
            message: reason.into(),
        }
    }

    /// The wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::StartBattle { .. } => "startBattle",
            Self::TurnNotification { .. } => "turnNotification",
            Self::UpdateAttackCoords { .. } => "updateAttackCoords",
            Self::Attacked { .. } => "attacked",
            Self::GameOver { .. } => "gameOver",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
