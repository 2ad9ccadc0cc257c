//! Relay actor: a single Tokio task that owns every room and session.
//!
//! Connection handlers never touch shared state. They send
//! [`RelayCommand`]s through a [`RelayHandle`] and receive outbound
//! [`Frame`]s on their own [`PeerSender`] queue. The actor also runs the
//! liveness sweep, so membership changes and evictions are serialized in
//! one place.

use std::collections::HashMap;
use std::time::Duration;

use stagecall_protocol::{ClientMessage, Codec, JsonCodec, Role, RoomCode, ServerMessage};
use stagecall_room::RoomRegistry;
use stagecall_session::{Admission, LivenessMonitor, Session, Sweep};
use stagecall_transport::{CLOSE_GOING_AWAY, ConnectionId, Frame, PeerSender};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::{RelayConfig, StagecallError};

/// Commands sent to the relay actor through its channel.
pub(crate) enum RelayCommand {
    /// Reserve a fresh room code.
    Allocate { reply: oneshot::Sender<RoomCode> },

    /// Register an admitted connection.
    Join {
        admission: Admission,
        peer: PeerSender,
    },

    /// A payload arrived from a connection.
    Inbound { id: ConnectionId, data: Vec<u8> },

    /// A connection answered a probe.
    Pong { id: ConnectionId },

    /// A connection closed.
    Leave { id: ConnectionId },

    /// Request member counts of one room.
    RoomInfo {
        code: RoomCode,
        reply: oneshot::Sender<Option<RoomInfo>>,
    },

    /// Request relay-wide counts.
    Stats { reply: oneshot::Sender<RelayStats> },

    /// Close every session and stop.
    Shutdown,
}

/// Member counts of one live room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub spectators: usize,
    pub performers: usize,
}

/// Relay-wide counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayStats {
    /// Rooms currently held, including allocated rooms nobody joined yet.
    pub rooms: usize,
    /// Admitted connections.
    pub sessions: usize,
}

/// Handle to the running relay actor.
///
/// Cheap to clone. Fire-and-forget commands never block; they only fail
/// once the actor has stopped.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    sender: mpsc::UnboundedSender<RelayCommand>,
}

impl RelayHandle {
    /// Spawns the relay actor on the current runtime.
    pub fn spawn(config: &RelayConfig) -> Self {
        let config = config.clone().validated();
        let (sender, receiver) = mpsc::unbounded_channel();
        let actor = RelayActor {
            registry: RoomRegistry::new(),
            sessions: HashMap::new(),
            liveness: LivenessMonitor::new(),
            codec: JsonCodec,
            max_choice_len: config.max_choice_len,
            receiver,
        };
        tokio::spawn(actor.run(config.heartbeat_interval));
        Self { sender }
    }

    /// Reserves a room code that no live room uses.
    pub async fn allocate_room(&self) -> Result<RoomCode, StagecallError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command(RelayCommand::Allocate { reply: reply_tx })?;
        reply_rx.await.map_err(|_| StagecallError::RelayUnavailable)
    }

    /// Registers an admitted connection. Its frames arrive on the queue
    /// behind `peer`.
    pub fn join(&self, admission: Admission, peer: PeerSender) -> Result<(), StagecallError> {
        self.command(RelayCommand::Join { admission, peer })
    }

    /// Forwards a payload received from `id`.
    pub fn inbound(&self, id: ConnectionId, data: Vec<u8>) -> Result<(), StagecallError> {
        self.command(RelayCommand::Inbound { id, data })
    }

    /// Reports a probe response from `id`.
    pub fn pong(&self, id: ConnectionId) -> Result<(), StagecallError> {
        self.command(RelayCommand::Pong { id })
    }

    /// Reports that `id` closed. Safe to call more than once.
    pub fn leave(&self, id: ConnectionId) -> Result<(), StagecallError> {
        self.command(RelayCommand::Leave { id })
    }

    /// Returns member counts of `code`, or `None` if no such room exists.
    pub async fn room_info(&self, code: &RoomCode) -> Result<Option<RoomInfo>, StagecallError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command(RelayCommand::RoomInfo {
            code: code.clone(),
            reply: reply_tx,
        })?;
        reply_rx.await.map_err(|_| StagecallError::RelayUnavailable)
    }

    pub async fn stats(&self) -> Result<RelayStats, StagecallError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command(RelayCommand::Stats { reply: reply_tx })?;
        reply_rx.await.map_err(|_| StagecallError::RelayUnavailable)
    }

    /// Closes every session with 1001 and stops the actor.
    pub fn shutdown(&self) -> Result<(), StagecallError> {
        self.command(RelayCommand::Shutdown)
    }

    fn command(&self, cmd: RelayCommand) -> Result<(), StagecallError> {
        self.sender
            .send(cmd)
            .map_err(|_| StagecallError::RelayUnavailable)
    }
}

/// The relay's state. Lives inside the actor task.
struct RelayActor {
    registry: RoomRegistry,
    sessions: HashMap<ConnectionId, Session>,
    liveness: LivenessMonitor,
    codec: JsonCodec,
    max_choice_len: usize,
    receiver: mpsc::UnboundedReceiver<RelayCommand>,
}

impl RelayActor {
    async fn run(mut self, heartbeat: Duration) {
        tracing::info!(heartbeat = ?heartbeat, "relay started");

        let mut probe = time::interval_at(Instant::now() + heartbeat, heartbeat);
        probe.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(RelayCommand::Shutdown) | None => {
                        self.close_all();
                        break;
                    }
                    Some(cmd) => self.handle(cmd),
                },
                _ = probe.tick() => self.sweep(),
            }
        }

        tracing::info!("relay stopped");
    }

    fn handle(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Allocate { reply } => {
                let _ = reply.send(self.registry.allocate());
            }
            RelayCommand::Join { admission, peer } => {
                let id = peer.id();
                if let Err(e) = self.handle_join(admission, peer) {
                    tracing::warn!(conn_id = %id, error = %e, "join rejected");
                }
            }
            RelayCommand::Inbound { id, data } => {
                if let Err(e) = self.handle_inbound(id, &data) {
                    tracing::error!(conn_id = %id, error = %e, "relay failed");
                }
            }
            RelayCommand::Pong { id } => {
                self.liveness.confirm(id);
            }
            RelayCommand::Leave { id } => {
                if let Err(e) = self.end_session(id, "closed") {
                    tracing::warn!(conn_id = %id, error = %e, "leave failed");
                }
            }
            RelayCommand::RoomInfo { code, reply } => {
                let info = self.registry.get(&code).map(|room| RoomInfo {
                    spectators: room.spectator_count(),
                    performers: room.performer_count(),
                    code,
                });
                let _ = reply.send(info);
            }
            RelayCommand::Stats { reply } => {
                let _ = reply.send(RelayStats {
                    rooms: self.registry.len(),
                    sessions: self.sessions.len(),
                });
            }
            // Handled by the run loop.
            RelayCommand::Shutdown => {}
        }
    }

    fn handle_join(&mut self, admission: Admission, peer: PeerSender) -> Result<(), StagecallError> {
        let session = Session::new(admission, peer);
        let id = session.id;
        if self.sessions.contains_key(&id) {
            tracing::warn!(conn_id = %id, "duplicate join ignored");
            return Ok(());
        }

        let presence = self.registry.join(&session.room, id, session.role)?;

        tracing::info!(
            conn_id = %id,
            room = %session.room,
            role = %session.role,
            spectators = presence.spectators,
            performers = presence.performers,
            "session joined"
        );

        let room = session.room.clone();
        self.sessions.insert(id, session);
        self.liveness.track(id);
        self.broadcast(&room, &presence.into())?;
        Ok(())
    }

    fn handle_inbound(&mut self, id: ConnectionId, data: &[u8]) -> Result<(), StagecallError> {
        let Some(session) = self.sessions.get(&id) else {
            tracing::debug!(conn_id = %id, "payload from unknown session dropped");
            return Ok(());
        };

        let outbound = match (session.role, ClientMessage::decode(&self.codec, data)) {
            (Role::Spectator, ClientMessage::Choice { value }) => {
                ServerMessage::choice(&value, self.max_choice_len)
            }
            (Role::Performer, ClientMessage::Clear) => ServerMessage::Clear,
            (role, msg) => {
                tracing::debug!(conn_id = %id, %role, ?msg, "message ignored");
                return Ok(());
            }
        };

        let room = session.room.clone();
        self.broadcast(&room, &outbound)?;
        Ok(())
    }

    /// Removes a session and tells the room's remaining performers.
    /// No-op for unknown ids.
    fn end_session(&mut self, id: ConnectionId, reason: &'static str) -> Result<(), StagecallError> {
        let Some(session) = self.sessions.remove(&id) else {
            return Ok(());
        };
        self.liveness.untrack(id);

        tracing::info!(
            conn_id = %id,
            room = %session.room,
            role = %session.role,
            reason,
            "session ended"
        );

        if let Some(presence) = self.registry.leave(&session.room, id, session.role)? {
            self.broadcast(&session.room, &presence.into())?;
        }
        Ok(())
    }

    /// Sends `msg` to every performer of `code` whose queue is still open.
    /// Returns how many received it.
    fn broadcast(&self, code: &RoomCode, msg: &ServerMessage) -> Result<usize, StagecallError> {
        let Some(room) = self.registry.get(code) else {
            return Ok(0);
        };
        let text = String::from_utf8_lossy(&self.codec.encode(msg)?).into_owned();

        let delivered = room
            .members(Role::Performer)
            .filter_map(|id| self.sessions.get(&id))
            .filter(|session| session.send(Frame::Text(text.clone())))
            .count();
        tracing::trace!(room = %code, delivered, "broadcast");
        Ok(delivered)
    }

    fn sweep(&mut self) {
        let Sweep { evict, probe } = self.liveness.sweep();

        for id in evict {
            if let Some(session) = self.sessions.get(&id) {
                session.send(Frame::Terminate);
            }
            tracing::info!(conn_id = %id, "evicting unresponsive connection");
            if let Err(e) = self.end_session(id, "unresponsive") {
                tracing::warn!(conn_id = %id, error = %e, "eviction cleanup failed");
            }
        }

        for id in probe {
            if let Some(session) = self.sessions.get(&id) {
                session.send(Frame::Ping);
            }
        }
    }

    fn close_all(&mut self) {
        tracing::info!(sessions = self.sessions.len(), "closing all sessions");
        for (_, session) in self.sessions.drain() {
            session.send(Frame::Close {
                code: CLOSE_GOING_AWAY,
                reason: "server shutting down".to_string(),
            });
        }
        self.liveness = LivenessMonitor::new();
    }
}
