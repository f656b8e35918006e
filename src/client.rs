//! Client struct definition
//!
//! The registry's view of a registered connection: its name and a
//! cloned sender into the connection's outbound queue.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ClientId;

/// Registered client handle
///
/// The registry only holds this clone of the sender. The socket write
/// half belongs to the connection's writer task, which stops once every
/// sender clone is dropped.
#[derive(Debug, Clone)]
pub struct Client {
    /// Identifier of the owning connection
    pub id: ClientId,
    /// Screen name, immutable once registered
    pub name: String,
    /// Server → Client line channel
    pub sender: mpsc::Sender<ServerMessage>,
}

impl Client {
    /// Create a new client handle
    pub fn new(id: ClientId, name: String, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self { id, name, sender }
    }

    /// Queue a line for this client without waiting
    ///
    /// Returns an error if the queue is full (client not reading) or the
    /// channel is closed (client disconnected). The line is dropped in
    /// both cases.
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SendError::QueueFull,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    /// Check whether two handles point at the same outbound queue
    pub fn same_channel(&self, other: &Client) -> bool {
        self.sender.same_channel(&other.sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_send() {
        let (tx, mut rx) = mpsc::channel(8);
        let client = Client::new(ClientId::new(), "Alice".to_string(), tx);

        client.send(ServerMessage::NameAccepted).unwrap();

        assert_eq!(rx.try_recv().ok(), Some(ServerMessage::NameAccepted));
    }

    #[test]
    fn test_client_send_closed() {
        let (tx, rx) = mpsc::channel(8);
        let client = Client::new(ClientId::new(), "Alice".to_string(), tx);
        drop(rx);

        let result = client.send(ServerMessage::NameAccepted);
        assert!(matches!(result, Err(SendError::ChannelClosed)));
    }

    #[test]
    fn test_client_send_full_does_not_wait() {
        let (tx, mut rx) = mpsc::channel(1);
        let client = Client::new(ClientId::new(), "Alice".to_string(), tx);

        client.send(ServerMessage::NameAccepted).unwrap();
        let result = client.send(ServerMessage::SubmitName);

        assert!(matches!(result, Err(SendError::QueueFull)));
        assert_eq!(rx.try_recv().ok(), Some(ServerMessage::NameAccepted));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_same_channel() {
        let (tx, _rx) = mpsc::channel(8);
        let (other_tx, _other_rx) = mpsc::channel(8);
        let a = Client::new(ClientId::new(), "a".to_string(), tx.clone());
        let b = Client::new(ClientId::new(), "b".to_string(), tx);
        let c = Client::new(ClientId::new(), "c".to_string(), other_tx);

        assert!(a.same_channel(&b));
        assert!(!a.same_channel(&c));
    }
}
