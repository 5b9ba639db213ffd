//! Beehive chat relay server.
//!
//! Issues connection tokens for a shared secret and relays chat messages to
//! every connected client, resyncing clients whose writes fail.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin beehive-server -- --password secret
//! cargo run --bin beehive-server -- --password secret --host 0.0.0.0 --port 3000
//! ```

use std::{sync::Arc, time::Duration};

use beehive_server::{
    domain::{RetryPolicy, SharedSecret},
    infrastructure::token_store::InMemoryTokenStore,
    ui::Server,
    usecase::{
        AuthenticateUseCase, ConnectConnectionUseCase, ConnectionHub,
        DisconnectConnectionUseCase, SendChatUseCase,
    },
};
use beehive_shared::logger::setup_logger;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "beehive-server")]
#[command(about = "Token-gated WebSocket chat relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8081")]
    port: u16,

    /// Shared secret clients exchange for a connection token
    #[arg(long)]
    password: String,

    /// Only accept WebSocket upgrades carrying this Origin header
    #[arg(long)]
    allowed_origin: Option<String>,

    /// Back-off unit between delivery attempts, in milliseconds
    #[arg(long, default_value = "1000")]
    retry_backoff_ms: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize dependencies in order:
    // 1. TokenStore
    // 2. Connection hub
    // 3. UseCases
    // 4. Server
    let secret = SharedSecret::new(args.password)?;

    // 1. Create TokenStore (in-memory)
    let token_store = Arc::new(InMemoryTokenStore::new());

    // 2. Start the connection hub
    let policy = RetryPolicy::with_backoff_unit(Duration::from_millis(args.retry_backoff_ms));
    let hub = ConnectionHub::spawn(policy);

    // 3. Create UseCases
    let authenticate_usecase = Arc::new(AuthenticateUseCase::new(token_store.clone(), secret));
    let connect_connection_usecase = Arc::new(ConnectConnectionUseCase::new(
        token_store.clone(),
        hub.clone(),
    ));
    let disconnect_connection_usecase = Arc::new(DisconnectConnectionUseCase::new(
        token_store.clone(),
        hub.clone(),
    ));
    let send_chat_usecase = Arc::new(SendChatUseCase::new(hub.clone()));

    // 4. Create and run the server
    let server = Server::new(
        authenticate_usecase,
        connect_connection_usecase,
        disconnect_connection_usecase,
        send_chat_usecase,
        hub,
        args.allowed_origin,
    );
    server.run(args.host, args.port).await
}
