//! Line-based Chat Server Library
//!
//! A single-room TCP chat relay. Clients claim a unique screen name,
//! then every line they send is either broadcast to the room or, when it
//! contains `name>>`, delivered to that one client (and echoed to the
//! sender).
//!
//! # Protocol
//! - `SUBMITNAME`: server asks for a name, repeated until a free one arrives
//! - `NAMEACCEPTED`: handshake done
//! - `CLIENTLIST<a>,<b>,...`: roster, pushed to everyone on each join
//! - `MESSAGE <sender>: <body>`: chat delivery
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the client registry
//! - Each connection has a `handler` task talking to it through a `ServerHandle`
//! - No locks needed - name claims are atomic because the actor handles
//!   one command at a time
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use line_chat_server::{acceptor, spawn_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:9001").await.unwrap();
//!     acceptor::run(listener, spawn_server()).await;
//! }
//! ```

pub mod acceptor;
pub mod client;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod roster;
pub mod router;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use client::Client;
pub use error::{AppError, SendError};
pub use handler::{handle_connection, Connection};
pub use message::ServerMessage;
pub use registry::Registry;
pub use router::{classify, ChatMessage};
pub use server::{spawn_server, ChatServer, ServerCommand, ServerHandle};
pub use types::{ClientId, ConnectionState};
