//! Connection handler
//!
//! Drives one client through `AwaitingName → Registered → Closed`.
//! The socket is framed into lines and split: this task reads, a spawned
//! writer task drains the connection's outbound queue into the socket.

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::message::ServerMessage;
use crate::server::ServerHandle;
use crate::types::{ClientId, ConnectionState};

/// Longest accepted input line, in bytes
pub const MAX_LINE_LENGTH: usize = 8 * 1024;

/// Outbound queue depth per connection
///
/// The server never waits on this queue; lines for a client whose queue
/// is full are dropped.
pub const OUTBOUND_BUFFER_SIZE: usize = 256;

/// Per-connection state
pub struct Connection {
    id: ClientId,
    /// Assigned screen name (None until the handshake succeeds)
    name: Option<String>,
    state: ConnectionState,
    server: ServerHandle,
    /// Server → Client queue; the writer task owns the receiving end
    outbound: mpsc::Sender<ServerMessage>,
}

impl Connection {
    pub fn new(id: ClientId, server: ServerHandle, outbound: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id,
            name: None,
            state: ConnectionState::AwaitingName,
            server,
            outbound,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Run the state machine until the connection is closed
    ///
    /// Returns an error on transport failure; the caller still has to
    /// call [`Connection::close`].
    pub async fn run<R>(&mut self, lines: &mut R) -> Result<(), AppError>
    where
        R: Stream<Item = Result<String, LinesCodecError>> + Unpin,
    {
        loop {
            match self.state {
                ConnectionState::AwaitingName => self.negotiate_name(lines).await?,
                ConnectionState::Registered => self.relay(lines).await?,
                ConnectionState::Closed => return Ok(()),
            }
        }
    }

    /// One round of the handshake: prompt, read, try to claim
    async fn negotiate_name<R>(&mut self, lines: &mut R) -> Result<(), AppError>
    where
        R: Stream<Item = Result<String, LinesCodecError>> + Unpin,
    {
        if self.outbound.send(ServerMessage::SubmitName).await.is_err() {
            self.state = ConnectionState::Closed;
            return Ok(());
        }

        let Some(name) = read_line(lines).await? else {
            self.state = ConnectionState::Closed;
            return Ok(());
        };

        let accepted = self
            .server
            .try_register(self.id, name.clone(), self.outbound.clone())
            .await?;

        if accepted {
            info!("Client {} accepted as '{}'", self.id, name);
            self.name = Some(name);
            self.state = ConnectionState::Registered;
        } else {
            debug!("Client {} name '{}' taken, prompting again", self.id, name);
        }
        Ok(())
    }

    /// Forward every line to the router until the peer goes away
    async fn relay<R>(&mut self, lines: &mut R) -> Result<(), AppError>
    where
        R: Stream<Item = Result<String, LinesCodecError>> + Unpin,
    {
        let Some(name) = self.name.clone() else {
            self.state = ConnectionState::Closed;
            return Ok(());
        };

        while let Some(line) = read_line(lines).await? {
            debug!("Line from '{}': {}", name, line);
            self.server.chat(self.id, name.clone(), line).await?;
        }

        self.state = ConnectionState::Closed;
        Ok(())
    }

    /// Release the registry entry, if any, and mark the connection closed
    ///
    /// Never fails; other connections are not notified.
    pub async fn close(&mut self) {
        if let Some(name) = self.name.clone() {
            if let Err(e) = self.server.remove(self.id, name).await {
                debug!("Deregister for {} skipped: {}", self.id, e);
            }
        }
        self.state = ConnectionState::Closed;
    }
}

async fn read_line<R>(lines: &mut R) -> Result<Option<String>, AppError>
where
    R: Stream<Item = Result<String, LinesCodecError>> + Unpin,
{
    match lines.next().await {
        Some(Ok(line)) => Ok(Some(line)),
        Some(Err(e)) => Err(e.into()),
        None => Ok(None),
    }
}

/// Handle a new connection
///
/// Sets up line framing and the writer task, runs the state machine and
/// tears everything down. Transport errors are logged and returned; they
/// never affect other connections.
pub async fn handle_connection<S>(
    stream: S,
    peer: String,
    server: ServerHandle,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    let (mut sink, mut lines) = framed.split::<String>();

    let client_id = ClientId::new();
    info!("Client {} connected from {}", client_id, peer);

    // Channel for server -> client lines
    let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_BUFFER_SIZE);

    // Write task ends once every sender clone (ours and the registry's) is gone
    let write_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            if let Err(e) = sink.send(msg.to_string()).await {
                debug!("Write failed, ending write task: {}", e);
                break;
            }
        }
        // Closing an already broken socket is not an error
        let _ = sink.close().await;
    });

    let mut conn = Connection::new(client_id, server, msg_tx);
    let result = conn.run(&mut lines).await;
    if let Err(e) = &result {
        warn!("Client {} transport error: {}", client_id, e);
    }

    conn.close().await;
    drop(conn);
    drop(lines);
    let _ = write_task.await;

    info!("Client {} disconnected", client_id);
    result
}
