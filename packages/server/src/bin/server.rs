//! Room-based WebSocket chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --host 0.0.0.0 --port 3000
//! HIROBA_PRUNE_EMPTY_ROOMS=true cargo run --bin hiroba-server
//! ```

use std::time::Duration;

use clap::Parser;
use hiroba_server::{app::build_server, config::ServerConfig};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "Room-based WebSocket chat server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HIROBA_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "HIROBA_PORT", default_value = "8080")]
    port: u16,

    /// Maximum number of concurrent connections
    #[arg(long, env = "HIROBA_MAX_CONNECTIONS", default_value = "1024")]
    max_connections: usize,

    /// Number of messages kept per room
    #[arg(long, env = "HIROBA_HISTORY_CAPACITY", default_value = "100")]
    history_capacity: usize,

    /// Length of each connection's outbound queue; a client that falls this far behind is dropped
    #[arg(
        long,
        env = "HIROBA_OUTBOUND_QUEUE_CAPACITY",
        default_value = "256",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    outbound_queue_capacity: u64,

    /// Maximum message length in characters
    #[arg(long, env = "HIROBA_MAX_MESSAGE_LENGTH", default_value = "2000")]
    max_message_length: usize,

    /// Milliseconds after which a typing indicator without refresh is cleared
    #[arg(long, env = "HIROBA_TYPING_TIMEOUT_MS", default_value = "1000")]
    typing_timeout_ms: u64,

    /// Milliseconds between sweeps of expired typing indicators
    #[arg(
        long,
        env = "HIROBA_TYPING_SWEEP_INTERVAL_MS",
        default_value = "250",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    typing_sweep_interval_ms: u64,

    /// Remove rooms once their last member leaves
    #[arg(long, env = "HIROBA_PRUNE_EMPTY_ROOMS", default_value_t = false)]
    prune_empty_rooms: bool,

    /// Room that is never removed, even when empty
    #[arg(long, env = "HIROBA_DEFAULT_ROOM", default_value = "default")]
    default_room: String,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_connections: args.max_connections,
            history_capacity: args.history_capacity,
            outbound_queue_capacity: usize::try_from(args.outbound_queue_capacity)
                .unwrap_or(usize::MAX),
            max_message_length: args.max_message_length,
            typing_timeout: Duration::from_millis(args.typing_timeout_ms),
            typing_sweep_interval: Duration::from_millis(args.typing_sweep_interval_ms),
            prune_empty_rooms: args.prune_empty_rooms,
            default_room: args.default_room,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(&["hiroba_server", env!("CARGO_BIN_NAME")], "debug");

    let config = ServerConfig::from(Args::parse());
    tracing::debug!("{:?}", config);

    let server = build_server(&config);
    if let Err(e) = server.run(config.host.clone(), config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
