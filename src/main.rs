//! Line Chat Server - Entry Point
//!
//! Starts the ChatServer actor and the TCP accept loop.

use std::env;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use line_chat_server::acceptor::{self, DEFAULT_ADDR};
use line_chat_server::spawn_server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=line_chat_server=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("line_chat_server=info")),
        )
        .init();

    // Get bind address from command line or use default
    let addr = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let listener = TcpListener::bind(&addr).await?;
    info!("Chat server listening on {}", addr);

    let server = spawn_server();
    info!("ChatServer actor started");

    acceptor::run(listener, server).await;
    Ok(())
}
