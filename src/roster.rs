//! Roster publisher
//!
//! Pushes the full list of registered names to every registered client.
//! Only joins trigger a publish; a departure leaves every client with
//! the last roster it received.

use tracing::{debug, warn};

use crate::message::ServerMessage;
use crate::registry::Registry;

/// Build the roster line from the current membership
pub fn build(registry: &Registry) -> ServerMessage {
    ServerMessage::ClientList(registry.names())
}

/// Send the current roster to every registered client
pub fn publish(registry: &Registry) {
    let roster = build(registry);
    let recipients = registry.snapshot();

    debug!("Publishing roster to {} clients", recipients.len());

    for client in recipients {
        if let Err(e) = client.send(roster.clone()) {
            warn!("Roster not delivered to '{}': {}", client.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::types::ClientId;

    #[test]
    fn test_build_empty() {
        let registry = Registry::new();
        assert_eq!(build(&registry).to_string(), "CLIENTLIST");
    }

    #[test]
    fn test_publish_reaches_all_in_join_order() {
        let mut registry = Registry::new();
        let (a_tx, mut a_rx) = mpsc::channel(8);
        let (b_tx, mut b_rx) = mpsc::channel(8);
        registry.try_register(ClientId::new(), "A", a_tx);
        publish(&registry);
        registry.try_register(ClientId::new(), "B", b_tx);
        publish(&registry);

        assert_eq!(a_rx.try_recv().unwrap().to_string(), "CLIENTLISTA");
        assert_eq!(a_rx.try_recv().unwrap().to_string(), "CLIENTLISTA,B");
        assert_eq!(b_rx.try_recv().unwrap().to_string(), "CLIENTLISTA,B");
        assert!(b_rx.try_recv().is_err());
    }
}
