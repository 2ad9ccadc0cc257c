//! Error types for the session layer.

use stagecall_transport::CLOSE_POLICY_VIOLATION;

/// Reasons a connection is refused at admission.
///
/// The `Display` text is what the client sees as the close reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No `room` parameter, or an empty one.
    #[error("missing room parameter")]
    MissingRoom,

    /// No `role` parameter.
    #[error("missing role parameter")]
    MissingRole,

    /// `role` was something other than `spectator` or `performer`.
    #[error("invalid role {0:?}, expected \"spectator\" or \"performer\"")]
    InvalidRole(String),
}

impl SessionError {
    /// WebSocket close code to reject the connection with.
    pub fn close_code(&self) -> u16 {
        CLOSE_POLICY_VIOLATION
    }
}
