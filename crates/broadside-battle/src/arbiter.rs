//! Battle phase: strict turn alternation and attack resolution.

use std::collections::HashSet;
use std::sync::Arc;

use broadside_protocol::{ClientMessage, Codec, Coordinate, JsonCodec, ServerMessage};
use broadside_session::{Player, SessionError, SessionState};
use broadside_transport::Connection;

use crate::BattleError;

/// Returns `true` if `target` is one of the opponent's ship cells.
///
/// Each ship cell stands alone: there is no notion of a ship being sunk,
/// and the same cell scores a hit every time it is attacked.
pub fn resolve_attack(target: Coordinate, ships: &HashSet<Coordinate>) -> bool {
    ships.contains(&target)
}

/// What happened in one resolved turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Seat of the player who attacked.
    pub attacker: usize,
    pub coordinates: Coordinate,
    pub hit: bool,
    /// Seat of the player whose attack is accepted next.
    pub next_active: usize,
}

/// Drives the battle: one loop, reading only from the active player.
///
/// ```text
/// AwaitingAttack(i) ──attack──→ resolve ──→ AwaitingAttack(1 - i)
///        │  ↑
///        └──┘ wrong kind / malformed: re-poll, turn unchanged
/// ```
///
/// Messages the waiting player sends stay queued in its connection and
/// are read when that player becomes active.
pub struct TurnArbiter<C, K = JsonCodec> {
    players: [Player<C, K>; 2],
    session: Arc<SessionState>,
}

impl<C, K> TurnArbiter<C, K>
where
    C: Connection,
    K: Codec,
{
    /// Takes over both players once setup is done.
    ///
    /// # Errors
    /// Returns [`BattleError::ShipsNotPlaced`] if either player has no
    /// placement yet.
    pub fn new(players: [Player<C, K>; 2], session: Arc<SessionState>) -> Result<Self, BattleError> {
        if let Some(p) = players.iter().find(|p| !p.has_placed_ships()) {
            return Err(BattleError::ShipsNotPlaced(p.index()));
        }
        Ok(Self { players, session })
    }

    pub fn players(&self) -> &[Player<C, K>; 2] {
        &self.players
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub fn into_players(self) -> [Player<C, K>; 2] {
        self.players
    }

    /// Plays turns until a player is lost. There is no win condition, so
    /// this never returns `Ok`.
    pub async fn run(&mut self) -> Result<(), BattleError> {
        loop {
            self.play_turn().await?;
        }
    }

    /// Plays exactly one turn.
    pub async fn play_turn(&mut self) -> Result<TurnOutcome, BattleError> {
        let attacker = self.session.active().await;
        let defender = 1 - attacker;

        // Fire-and-forget: nobody acknowledges a turn notification.
        self.send(attacker, &ServerMessage::turn_notification(true)).await?;
        self.send(defender, &ServerMessage::turn_notification(false)).await?;

        let coordinates = self.await_attack(attacker).await?;

        let hit = self.players[defender]
            .ships()
            .is_some_and(|ships| resolve_attack(coordinates, ships));
        if hit {
            self.players[defender].record_hit(coordinates);
        }
        tracing::info!(
            attacker = %self.players[attacker].name(),
            defender = %self.players[defender].name(),
            %coordinates,
            hit,
            "attack resolved"
        );

        self.send(attacker, &ServerMessage::attack_result(coordinates, hit)).await?;
        self.send(defender, &ServerMessage::attacked(coordinates, hit)).await?;

        let next_active = self.session.advance_turn().await?;
        Ok(TurnOutcome {
            attacker,
            coordinates,
            hit,
            next_active,
        })
    }

    /// Reads the active player's channel until it yields an attack.
    async fn await_attack(&self, index: usize) -> Result<Coordinate, BattleError> {
        let player = &self.players[index];
        loop {
            match player.channel().receive().await {
                Ok(ClientMessage::Attack { coordinates }) => {
                    tracing::debug!(player = %player.name(), %coordinates, "attack received");
                    return Ok(coordinates);
                }
                Ok(other) => {
                    let err = SessionError::UnexpectedMessageKind {
                        expected: "attack",
                        got: other.kind(),
                    };
                    tracing::warn!(player = %player.name(), error = %err, "ignoring message during battle");
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(player = %player.name(), error = %e, "ignoring message during battle");
                }
                Err(e) => {
                    tracing::info!(player = %player.name(), error = %e, "player lost during battle");
                    return Err(BattleError::peer_lost(index, player.name(), e));
                }
            }
        }
    }

    async fn send(&self, index: usize, msg: &ServerMessage) -> Result<(), BattleError> {
        let player = &self.players[index];
        player
            .channel()
            .send(msg)
            .await
            .map_err(|e| BattleError::peer_lost(index, player.name(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ships(cells: &[(u32, u32)]) -> HashSet<Coordinate> {
        cells.iter().copied().map(Coordinate::from).collect()
    }

    #[test]
    fn test_resolve_attack_is_set_membership() {
        let fleet = ships(&[(1, 1), (2, 2)]);
        assert!(resolve_attack(Coordinate::new(1, 1), &fleet));
        assert!(resolve_attack(Coordinate::new(2, 2), &fleet));
        assert!(!resolve_attack(Coordinate::new(1, 2), &fleet));
        assert!(!resolve_attack(Coordinate::new(5, 5), &fleet));
    }

    #[test]
    fn test_resolve_attack_is_repeatable() {
        let fleet = ships(&[(0, 0)]);
        let before = fleet.clone();
        for _ in 0..3 {
            assert!(resolve_attack(Coordinate::new(0, 0), &fleet));
        }
        assert_eq!(fleet, before);
    }

    #[test]
    fn test_resolve_attack_against_empty_fleet_misses() {
        assert!(!resolve_attack(Coordinate::new(0, 0), &HashSet::new()));
    }

    #[test]
    fn test_resolve_attack_matches_contains_exhaustively() {
        let fleet = ships(&[(0, 9), (3, 4), (9, 0)]);
        for x in 0..broadside_protocol::BOARD_SIZE {
            for y in 0..broadside_protocol::BOARD_SIZE {
                let c = Coordinate::new(x, y);
                assert_eq!(resolve_attack(c, &fleet), fleet.contains(&c));
            }
        }
    }
}
