use std::time::Duration;

use broadside::transport::WebSocketTransport;
use broadside::{BroadsideError, DEFAULT_BIND_ADDR, ServerConfig, SessionServer};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Host one two-player naval battle.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = DEFAULT_BIND_ADDR)]
    bind: String,

    /// Speak WebSocket instead of newline-delimited TCP.
    #[arg(long)]
    websocket: bool,

    /// Drop a player who stays silent this many seconds during setup or
    /// battle. Waits forever when omitted.
    #[arg(long)]
    read_timeout_secs: Option<u64>,

    /// How long a new connection may take to send its name (and, with
    /// `--websocket`, to complete the upgrade).
    #[arg(long, default_value_t = 10)]
    handshake_timeout_secs: u64,

    /// Largest frame accepted from a player, in bytes.
    #[arg(long, default_value_t = broadside::transport::DEFAULT_MAX_FRAME_LEN)]
    max_frame_len: usize,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            read_timeout: self.read_timeout_secs.map(Duration::from_secs),
            handshake_timeout: Some(Duration::from_secs(self.handshake_timeout_secs)),
            max_frame_len: self.max_frame_len,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), BroadsideError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.server_config();

    let result = if cli.websocket {
        let transport = WebSocketTransport::bind(&cli.bind)
            .await?
            .with_max_frame_len(config.max_frame_len)
            .with_handshake_timeout(config.handshake_timeout);
        SessionServer::with_transport(transport, config).run().await
    } else {
        SessionServer::builder()
            .bind(&cli.bind)
            .config(config)
            .build()
            .await?
            .run()
            .await
    };

    match result {
        Err(e) if e.is_peer_lost() => {
            tracing::info!("{e}");
            Ok(())
        }
        other => other,
    }
}
