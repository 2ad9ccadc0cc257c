//! Outbound handle for a single connection.
//!
//! The relay never touches sockets. It holds one [`PeerSender`] per session
//! and pushes [`Frame`]s into it; the connection task drains the other end
//! and writes them out.

use tokio::sync::mpsc;

use crate::{ConnectionId, Frame};

/// Cloneable sender half of a connection's outbound frame queue.
#[derive(Debug, Clone)]
pub struct PeerSender {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<Frame>,
}

impl PeerSender {
    /// Creates a sender for `id` and the receiver its connection task drains.
    pub fn channel(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx }, rx)
    }

    /// Returns the connection this sender writes to.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns `true` while the connection task is still draining frames.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Queues a frame. Best-effort: returns `false` and drops the frame if
    /// the connection is gone.
    pub fn send(&self, frame: Frame) -> bool {
        if !self.is_open() {
            return false;
        }
        self.tx.send(frame).is_ok()
    }
}
