//! Error types for the chat server
//!
//! Defines per-connection errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Application-level errors
///
/// Every variant is fatal for the connection that hit it and for
/// nothing else: the handler logs it and moves to `Closed`.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (reset, broken pipe, ...)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error (oversized line or invalid UTF-8 / IO underneath)
    #[error("Line codec error: {0}")]
    Codec(#[from] LinesCodecError),

    /// The server actor is gone
    #[error("Server channel closed")]
    ServerClosed,
}

/// Message send errors
///
/// Occurs when attempting to send messages through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The client is not draining its queue; the line was dropped
    #[error("Outbound queue full")]
    QueueFull,
}
