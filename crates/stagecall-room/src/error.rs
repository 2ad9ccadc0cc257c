//! Error types for the room layer.

use stagecall_protocol::{Role, RoomCode};
use stagecall_transport::ConnectionId;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The connection already holds a role in this room.
    #[error("{0} is already a {1} in room {2}")]
    AlreadyMember(ConnectionId, Role, RoomCode),
}
