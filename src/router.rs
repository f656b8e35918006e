//! Message routing
//!
//! Turns a chat line into a broadcast or a unicast and delivers it
//! through the registry. Both steps run inside the `ChatServer` actor, so
//! classification and delivery see the same membership.

use std::cmp::Reverse;

use tracing::debug;

use crate::message::{ServerMessage, UNICAST_SEPARATOR};
use crate::registry::Registry;

/// A routed chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    /// Delivered to every registered client, sender included
    Broadcast { sender: String, body: String },
    /// Delivered to the sender and `target` only
    Unicast {
        sender: String,
        target: String,
        body: String,
    },
}

impl ChatMessage {
    fn to_line(&self) -> ServerMessage {
        match self {
            ChatMessage::Broadcast { sender, body } | ChatMessage::Unicast { sender, body, .. } => {
                ServerMessage::Chat {
                    from: sender.clone(),
                    body: body.clone(),
                }
            }
        }
    }
}

/// Classify `line` against the currently registered names
///
/// A name is addressed when `name>>` occurs anywhere in the line. When
/// several names are addressed, the occurrence that starts earliest wins
/// and ties go to the longest name, so the result never depends on map
/// iteration order. The body is the line with the first occurrence of
/// `target>>` cut out.
pub fn classify<'a, I>(sender: &str, line: &str, names: I) -> ChatMessage
where
    I: IntoIterator<Item = &'a str>,
{
    let target = names
        .into_iter()
        .filter(|name| !name.is_empty())
        .filter_map(|name| {
            let prefix = format!("{}{}", name, UNICAST_SEPARATOR);
            line.find(&prefix).map(|pos| (pos, name))
        })
        .min_by_key(|(pos, name)| (*pos, Reverse(name.len())));

    match target {
        Some((_, target)) => {
            let prefix = format!("{}{}", target, UNICAST_SEPARATOR);
            ChatMessage::Unicast {
                sender: sender.to_string(),
                target: target.to_string(),
                body: line.replacen(&prefix, "", 1),
            }
        }
        None => ChatMessage::Broadcast {
            sender: sender.to_string(),
            body: line.to_string(),
        },
    }
}

/// Deliver a classified message
///
/// Recipients are looked up at delivery time. A recipient that has
/// disconnected in the meantime is skipped without error. Sends never
/// wait: a recipient whose queue is full loses the line, and nobody else
/// is held up by it.
pub fn dispatch(registry: &Registry, msg: &ChatMessage) {
    let line = msg.to_line();

    match msg {
        ChatMessage::Broadcast { sender, .. } => {
            let recipients = registry.snapshot();
            debug!("Broadcast from '{}' to {} clients", sender, recipients.len());
            for client in recipients {
                if let Err(e) = client.send(line.clone()) {
                    debug!("Skipping '{}': {}", client.name, e);
                }
            }
        }
        ChatMessage::Unicast { sender, target, .. } => {
            debug!("Unicast from '{}' to '{}'", sender, target);
            let from = registry.lookup(sender);
            let to = registry.lookup(target);

            if let Some(from) = from {
                let _ = from.send(line.clone());
            }

            match to {
                Some(to) if from.is_some_and(|from| from.same_channel(to)) => {}
                Some(to) => {
                    let _ = to.send(line);
                }
                None => debug!("Unicast target '{}' is gone, skipping", target),
            }
        }
    }
}
