//! ChatServer Actor implementation
//!
//! The central actor owns the client registry. Handlers never touch the
//! registry directly: registration, removal, lookups, snapshots and chat
//! routing all arrive as `ServerCommand`s and are processed one at a time.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::error::AppError;
use crate::message::ServerMessage;
use crate::registry::Registry;
use crate::router;
use crate::roster;
use crate::types::ClientId;

/// Channel buffer size for server commands
pub const COMMAND_BUFFER_SIZE: usize = 256;

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// Claim a screen name
    Register {
        client_id: ClientId,
        name: String,
        sender: mpsc::Sender<ServerMessage>,
        respond_to: oneshot::Sender<bool>,
    },
    /// Connection closed; drop its entry if it still owns one
    Deregister { client_id: ClientId, name: String },
    /// A chat line from a registered client
    Chat {
        client_id: ClientId,
        name: String,
        line: String,
    },
    /// Look up the channel registered under a name
    Lookup {
        name: String,
        respond_to: oneshot::Sender<Option<Client>>,
    },
    /// Current membership in join order
    Snapshot {
        respond_to: oneshot::Sender<Vec<Client>>,
    },
}

/// The main ChatServer actor
pub struct ChatServer {
    /// Registered clients: name -> Client
    registry: Registry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            registry: Registry::new(),
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    ///
    /// Nothing in here waits on a client: every line to a client goes
    /// through a non-blocking send, so one stalled reader cannot hold up
    /// the registry.
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Register {
                client_id,
                name,
                sender,
                respond_to,
            } => {
                let accepted = self.handle_register(client_id, name, sender);
                let _ = respond_to.send(accepted);
            }
            ServerCommand::Deregister { client_id, name } => {
                self.handle_deregister(client_id, name);
            }
            ServerCommand::Chat {
                client_id,
                name,
                line,
            } => {
                self.handle_chat(client_id, name, line);
            }
            ServerCommand::Lookup { name, respond_to } => {
                let _ = respond_to.send(self.registry.lookup(&name).cloned());
            }
            ServerCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(self.registry.snapshot());
            }
        }
    }

    /// Handle a name claim
    ///
    /// On success the acknowledgment and the new roster are queued before
    /// any other command runs, so `NAMEACCEPTED` always precedes the
    /// client's first `CLIENTLIST`.
    fn handle_register(
        &mut self,
        client_id: ClientId,
        name: String,
        sender: mpsc::Sender<ServerMessage>,
    ) -> bool {
        if !self.registry.try_register(client_id, &name, sender.clone()) {
            debug!("Client {} name '{}' rejected", client_id, name);
            return false;
        }

        info!("Client {} registered as '{}'", client_id, name);

        if let Err(e) = sender.try_send(ServerMessage::NameAccepted) {
            warn!("Client {} not acknowledged: {}", client_id, e);
        }
        roster::publish(&self.registry);

        debug!("Total clients: {}", self.registry.len());
        true
    }

    /// Handle client disconnection
    fn handle_deregister(&mut self, client_id: ClientId, name: String) {
        if self.registry.remove_owned(client_id, &name).is_some() {
            info!("Client {} ('{}') deregistered", client_id, name);
        }
        debug!("Total clients: {}", self.registry.len());
    }

    /// Handle a chat line
    fn handle_chat(&mut self, client_id: ClientId, name: String, line: String) {
        let Some(client) = self.registry.lookup(&name) else {
            return;
        };
        if client.id != client_id {
            return;
        }

        let names = self.registry.names();
        let msg = router::classify(&name, &line, names.iter().map(String::as_str));
        router::dispatch(&self.registry, &msg);
    }
}

/// Cheap-to-clone handle for talking to the ChatServer actor
#[derive(Debug, Clone)]
pub struct ServerHandle {
    sender: mpsc::Sender<ServerCommand>,
}

impl ServerHandle {
    /// Wrap an existing command sender
    pub fn new(sender: mpsc::Sender<ServerCommand>) -> Self {
        Self { sender }
    }

    /// Atomically claim `name` for connection `client_id`
    ///
    /// Returns false if the name is already held.
    pub async fn try_register(
        &self,
        client_id: ClientId,
        name: String,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<bool, AppError> {
        let (tx, rx) = oneshot::channel();
        self.send(ServerCommand::Register {
            client_id,
            name,
            sender,
            respond_to: tx,
        })
        .await?;
        rx.await.map_err(|_| AppError::ServerClosed)
    }

    /// Release `name` if `client_id` still holds it
    pub async fn remove(&self, client_id: ClientId, name: String) -> Result<(), AppError> {
        self.send(ServerCommand::Deregister { client_id, name }).await
    }

    /// Route a chat line from a registered client
    pub async fn chat(
        &self,
        client_id: ClientId,
        name: String,
        line: String,
    ) -> Result<(), AppError> {
        self.send(ServerCommand::Chat {
            client_id,
            name,
            line,
        })
        .await
    }

    pub async fn lookup(&self, name: &str) -> Result<Option<Client>, AppError> {
        let (tx, rx) = oneshot::channel();
        self.send(ServerCommand::Lookup {
            name: name.to_string(),
            respond_to: tx,
        })
        .await?;
        rx.await.map_err(|_| AppError::ServerClosed)
    }

    pub async fn snapshot(&self) -> Result<Vec<Client>, AppError> {
        let (tx, rx) = oneshot::channel();
        self.send(ServerCommand::Snapshot { respond_to: tx }).await?;
        rx.await.map_err(|_| AppError::ServerClosed)
    }

    async fn send(&self, cmd: ServerCommand) -> Result<(), AppError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| AppError::ServerClosed)
    }
}

/// Spawn a fresh ChatServer actor with an empty registry
pub fn spawn_server() -> ServerHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
    tokio::spawn(ChatServer::new(cmd_rx).run());
    ServerHandle::new(cmd_tx)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn register(
        server: &ServerHandle,
        name: &str,
    ) -> (ClientId, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(32);
        let id = ClientId::new();
        assert!(server.try_register(id, name.to_string(), tx).await.unwrap());
        (id, rx)
    }

    #[tokio::test]
    async fn test_register_sends_ack_then_roster() {
        let server = spawn_server();
        let (_, mut alice) = register(&server, "alice").await;

        assert_eq!(alice.recv().await, Some(ServerMessage::NameAccepted));
        assert_eq!(
            alice.recv().await,
            Some(ServerMessage::ClientList(vec!["alice".to_string()]))
        );
    }

    #[tokio::test]
    async fn test_duplicate_register_rejected_silently() {
        let server = spawn_server();
        let (_, _alice) = register(&server, "alice").await;

        let (tx, mut rx) = mpsc::channel(8);
        let accepted = server
            .try_register(ClientId::new(), "alice".to_string(), tx)
            .await
            .unwrap();

        assert!(!accepted);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_concurrent_register_single_winner() {
        let server = spawn_server();
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let server = server.clone();
            tasks.push(tokio::spawn(async move {
                let (tx, _rx) = mpsc::channel(32);
                server
                    .try_register(ClientId::new(), "alice".to_string(), tx)
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(server.snapshot().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_frees_name() {
        let server = spawn_server();
        let (id, _alice) = register(&server, "alice").await;

        server.remove(id, "alice".to_string()).await.unwrap();
        assert!(server.lookup("alice").await.unwrap().is_none());

        let (_, _again) = register(&server, "alice").await;
    }

    #[tokio::test]
    async fn test_stale_remove_keeps_new_owner() {
        let server = spawn_server();
        let (old_id, _old) = register(&server, "alice").await;
        server.remove(old_id, "alice".to_string()).await.unwrap();
        let (new_id, _new) = register(&server, "alice").await;

        server.remove(old_id, "alice".to_string()).await.unwrap();

        let owner = server.lookup("alice").await.unwrap().map(|c| c.id);
        assert_eq!(owner, Some(new_id));
    }

    #[tokio::test]
    async fn test_chat_from_unregistered_is_dropped() {
        let server = spawn_server();
        let (_, mut alice) = register(&server, "alice").await;
        alice.recv().await;
        alice.recv().await;

        server
            .chat(ClientId::new(), "alice".to_string(), "spoof".to_string())
            .await
            .unwrap();
        // Snapshot round-trip orders after the chat command.
        server.snapshot().await.unwrap();

        assert!(alice.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_client_queue_does_not_stall_registry() {
        let server = spawn_server();

        // One slot: NAMEACCEPTED fills it and nothing ever drains it.
        let (idle_tx, _idle_rx) = mpsc::channel(1);
        assert!(server
            .try_register(ClientId::new(), "idle".to_string(), idle_tx)
            .await
            .unwrap());

        let (alice_id, mut alice) = register(&server, "alice").await;
        for i in 0..100 {
            server
                .chat(alice_id, "alice".to_string(), format!("line {i}"))
                .await
                .unwrap();
        }

        let carol = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            register(&server, "carol"),
        )
        .await;
        assert!(carol.is_ok(), "registration stalled behind a full queue");

        assert_eq!(alice.recv().await, Some(ServerMessage::NameAccepted));
        assert_eq!(
            alice.recv().await,
            Some(ServerMessage::ClientList(vec![
                "idle".to_string(),
                "alice".to_string()
            ]))
        );
        assert_eq!(server.snapshot().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_departure_does_not_republish_roster() {
        let server = spawn_server();
        let (_, mut a) = register(&server, "A").await;
        let (b_id, _b) = register(&server, "B").await;

        server.remove(b_id, "B".to_string()).await.unwrap();
        server.snapshot().await.unwrap();

        let mut last_roster = None;
        while let Ok(msg) = a.try_recv() {
            if let ServerMessage::ClientList(names) = msg {
                last_roster = Some(names);
            }
        }
        assert_eq!(last_roster, Some(vec!["A".to_string(), "B".to_string()]));
    }
}
