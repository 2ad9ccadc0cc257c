//! Session: the relay's record of one admitted connection.

use stagecall_protocol::{Role, RoomCode};
use stagecall_transport::{ConnectionId, Frame, PeerSender};

use crate::Admission;

/// One admitted, live connection.
///
/// Room and role are fixed at admission. The session is dropped when the
/// connection closes or is evicted; a reconnecting client gets a new one.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: ConnectionId,
    pub room: RoomCode,
    pub role: Role,
    peer: PeerSender,
}

impl Session {
    /// Creates a session for an admitted connection.
    pub fn new(admission: Admission, peer: PeerSender) -> Self {
        Self {
            id: peer.id(),
            room: admission.room,
            role: admission.role,
            peer,
        }
    }

    /// Queues a frame for the connection. Best-effort; see [`PeerSender::send`].
    pub fn send(&self, frame: Frame) -> bool {
        self.peer.send(frame)
    }
}
