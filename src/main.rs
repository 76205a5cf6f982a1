//! Line-oriented TCP Chat Server - Entry Point
//!
//! Binds the listener and runs the ChatServer accept loop.

use std::env;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use group_chat_server::{ChatServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=group_chat_server=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("group_chat_server=info")),
        )
        .init();

    // Port or host:port from the command line, default 0.0.0.0:1500
    let config = ServerConfig::from_args(env::args().skip(1))?;

    // Start TCP listener
    let listener = TcpListener::bind(&config.addr).await?;
    info!("Chat server bound to {}", config.addr);

    ChatServer::new(config).run(listener).await;

    Ok(())
}
