//! Server configuration.

use std::time::Duration;

use broadside_transport::DEFAULT_MAX_FRAME_LEN;

/// Address the server binds to when none is given.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:12345";

/// How long a new connection may take to announce its name.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for a [`SessionServer`](crate::SessionServer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bound on every setup and battle read. `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// Bound on the name announcement. `None` waits forever, which lets a
    /// silent connection hold a seat.
    pub handshake_timeout: Option<Duration>,
    /// Largest frame accepted from a player.
    pub max_frame_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            read_timeout: None,
            handshake_timeout: Some(DEFAULT_HANDSHAKE_TIMEOUT),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}
