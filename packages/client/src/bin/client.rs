//! Beehive chat client.
//!
//! Exchanges the password for a token, connects to the relay and sends
//! messages typed on stdin. Reconnects on connection loss (max 5 attempts
//! with 5 second interval). A wrong password exits immediately.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin beehive-client -- --username Alice --password secret
//! cargo run --bin beehive-client -- -n Bob -P secret --url http://127.0.0.1:8081
//! ```

use clap::Parser;

use beehive_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "beehive-client")]
#[command(about = "Chat client for the Beehive relay", long_about = None)]
struct Args {
    /// Name shown next to your messages
    #[arg(short = 'n', long)]
    username: String,

    /// Shared secret configured on the server
    #[arg(short = 'P', long)]
    password: String,

    /// Relay base URL
    #[arg(short = 'u', long, default_value = "http://127.0.0.1:8081")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = beehive_client::run_client(args.url, args.username, args.password).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
