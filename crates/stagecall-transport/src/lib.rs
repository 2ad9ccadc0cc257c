//! Transport layer for Stagecall.
//!
//! Provides the [`Connection`] trait that abstracts over a live client
//! socket, the [`Frame`]/[`Inbound`] vocabulary that travels across it,
//! and [`PeerSender`], the cloneable outbound handle the relay fans out to.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket connection over `axum`'s upgrade

#![allow(async_fn_in_trait)]

mod error;
mod peer;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use peer::PeerSender;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketConnection;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Close code sent when a connection is rejected at admission.
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// Close code sent to every live connection when the server stops.
pub const CLOSE_GOING_AWAY: u16 = 1001;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-unique `ConnectionId`.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Something the server wants written to a client socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text frame, already encoded by the protocol codec.
    Text(String),

    /// A liveness probe. The client's pong comes back as [`Inbound::Pong`].
    Ping,

    /// A close handshake with a status code and reason.
    Close { code: u16, reason: String },

    /// Drop the socket without a close handshake.
    Terminate,
}

impl Frame {
    /// Returns `true` if the connection must stop after this frame.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Close { .. } | Self::Terminate)
    }
}

/// Something a client socket delivered to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Application payload (text or binary frame contents).
    Data(Vec<u8>),

    /// Response to a [`Frame::Ping`].
    Pong,
}

/// A single live client socket.
pub trait Connection: Send + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Writes a frame to the remote peer.
    ///
    /// [`Frame::Terminate`] writes nothing; the caller drops the connection.
    async fn send(&mut self, frame: Frame) -> Result<(), Self::Error>;

    /// Receives the next inbound event from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is closed.
    async fn recv(&mut self) -> Result<Option<Inbound>, Self::Error>;

    /// Closes the connection with a status code and reason.
    async fn close(&mut self, code: u16, reason: &str) -> Result<(), Self::Error> {
        self.send(Frame::Close {
            code,
            reason: reason.to_string(),
        })
        .await
    }

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
