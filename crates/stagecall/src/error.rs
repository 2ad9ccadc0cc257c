//! Unified error type for Stagecall.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use stagecall_protocol::ProtocolError;
use stagecall_room::RoomError;
use stagecall_session::SessionError;
use stagecall_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum StagecallError {
    /// A transport-level error (send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, bad code or role).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A connection was refused at admission.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (unknown room, duplicate membership).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an I/O error.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The relay actor has stopped.
    #[error("relay is not running")]
    RelayUnavailable,
}

impl IntoResponse for StagecallError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::RelayUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(error = %self, %status, "request failed");
        (status, self.to_string()).into_response()
    }
}
