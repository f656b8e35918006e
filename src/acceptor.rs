//! TCP accept loop
//!
//! Spawns one handler task per accepted connection.

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::handler::handle_connection;
use crate::server::ServerHandle;

/// Default listening address
pub const DEFAULT_ADDR: &str = "0.0.0.0:9001";

/// Accept connections forever
///
/// Accept failures are logged and do not stop the loop.
pub async fn run(listener: TcpListener, server: ServerHandle) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let server = server.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, addr.to_string(), server).await {
                        error!("Connection handler error for {}: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
