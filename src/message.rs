//! Line protocol definitions
//!
//! Every frame is one newline-terminated text line. Server lines start
//! with an uppercase keyword; client lines are either a proposed name
//! (during the handshake) or free chat text.

use std::fmt;

/// Handshake prompt keyword
pub const SUBMIT_NAME: &str = "SUBMITNAME";
/// Handshake success keyword
pub const NAME_ACCEPTED: &str = "NAMEACCEPTED";
/// Chat delivery keyword
pub const MESSAGE: &str = "MESSAGE";
/// Roster keyword
pub const CLIENT_LIST: &str = "CLIENTLIST";
/// Separator between a unicast target name and the body
pub const UNICAST_SEPARATOR: &str = ">>";

/// Server → Client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Ask the client for a screen name
    SubmitName,
    /// Screen name accepted
    NameAccepted,
    /// Chat content, broadcast or unicast
    Chat { from: String, body: String },
    /// Full roster, in join order
    ClientList(Vec<String>),
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::SubmitName => f.write_str(SUBMIT_NAME),
            ServerMessage::NameAccepted => f.write_str(NAME_ACCEPTED),
            ServerMessage::Chat { from, body } => write!(f, "{} {}: {}", MESSAGE, from, body),
            ServerMessage::ClientList(names) => write!(f, "{}{}", CLIENT_LIST, names.join(",")),
        }
    }
}
