//! A connected player and the state the server keeps for it.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use broadside_protocol::{Coordinate, JsonCodec};

use crate::{MessageChannel, SessionError};

/// One of the two players in a session.
///
/// The channel is shared (`Arc`) so the server can still reach a player
/// while its `Player` value is owned by a setup task. Every other field
/// has exactly one writer at a time: `ships` its own setup task,
/// `hits_received` the turn arbiter.
pub struct Player<C, K = JsonCodec> {
    index: usize,
    name: String,
    channel: Arc<MessageChannel<C, K>>,
    ships: Option<HashSet<Coordinate>>,
    hits_received: HashSet<Coordinate>,
}

impl<C, K> Player<C, K> {
    /// Creates a player at seat `index` (0 or 1) with no ships placed.
    pub fn new(index: usize, name: impl Into<String>, channel: Arc<MessageChannel<C, K>>) -> Self {
        Self {
            index,
            name: name.into(),
            channel,
            ships: None,
            hits_received: HashSet::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel(&self) -> &Arc<MessageChannel<C, K>> {
        &self.channel
    }

    /// The declared ship cells, or `None` before setup completes.
    pub fn ships(&self) -> Option<&HashSet<Coordinate>> {
        self.ships.as_ref()
    }

    pub fn has_placed_ships(&self) -> bool {
        self.ships.is_some()
    }

    /// Records the ship placement. An empty placement is accepted.
    ///
    /// # Errors
    /// Returns [`SessionError::ShipsAlreadyPlaced`] on a second call; the
    /// first placement is kept.
    pub fn place_ships(
        &mut self,
        coords: impl IntoIterator<Item = Coordinate>,
    ) -> Result<(), SessionError> {
        if self.ships.is_some() {
            return Err(SessionError::ShipsAlreadyPlaced(self.name.clone()));
        }
        self.ships = Some(coords.into_iter().collect());
        Ok(())
    }

    /// Cells of this player's board the opponent has hit.
    pub fn hits_received(&self) -> &HashSet<Coordinate> {
        &self.hits_received
    }

    /// Marks `coord` as hit. Returns `false` if it was already marked.
    pub fn record_hit(&mut self, coord: Coordinate) -> bool {
        self.hits_received.insert(coord)
    }
}

impl<C, K> fmt::Debug for Player<C, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("ships", &self.ships)
            .field("hits_received", &self.hits_received)
            .finish_non_exhaustive()
    }
}
