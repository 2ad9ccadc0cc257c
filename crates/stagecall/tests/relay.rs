//! Relay actor tests with in-memory peers.
//!
//! Each client is a `PeerSender` whose receiving end the test holds, so
//! no sockets are involved. Liveness tests run on a paused clock.

use std::time::Duration;

use stagecall::prelude::*;
use tokio::sync::mpsc::UnboundedReceiver;

// ===========================================================================
// Helpers
// ===========================================================================

const LONG_HEARTBEAT: Duration = Duration::from_secs(3600);

fn spawn_relay(heartbeat: Duration) -> RelayHandle {
    RelayHandle::spawn(&RelayConfig {
        heartbeat_interval: heartbeat,
        ..RelayConfig::default()
    })
}

fn code(raw: &str) -> RoomCode {
    RoomCode::parse(raw).unwrap()
}

struct Client {
    id: ConnectionId,
    rx: UnboundedReceiver<Frame>,
}

impl Client {
    fn join(relay: &RelayHandle, id: u64, room: &str, role: Role) -> Self {
        let id = ConnectionId::new(id);
        let (peer, rx) = PeerSender::channel(id);
        relay
            .join(
                Admission {
                    room: code(room),
                    role,
                },
                peer,
            )
            .unwrap();
        Self { id, rx }
    }

    fn send(&self, relay: &RelayHandle, json: &str) {
        relay.inbound(self.id, json.as_bytes().to_vec()).unwrap();
    }

    /// Every frame queued so far.
    fn frames(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Every text frame queued so far, decoded.
    fn messages(&mut self) -> Vec<ServerMessage> {
        self.frames()
            .into_iter()
            .filter_map(|frame| match frame {
                Frame::Text(text) => Some(serde_json::from_str(&text).unwrap()),
                _ => None,
            })
            .collect()
    }
}

/// Waits until the actor has processed everything sent before this call.
async fn settle(relay: &RelayHandle) -> RelayStats {
    relay.stats().await.unwrap()
}

fn presence(spectators: usize, performers: usize) -> ServerMessage {
    ServerMessage::Presence {
        spectators,
        performers,
    }
}

fn choice(value: &str) -> ServerMessage {
    ServerMessage::Choice {
        value: value.to_string(),
    }
}

// ===========================================================================
// Allocation
// ===========================================================================

#[tokio::test]
async fn test_allocate_room_creates_empty_room() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let room = relay.allocate_room().await.unwrap();
    let info = relay.room_info(&room).await.unwrap().unwrap();

    assert_eq!(room.as_str().len(), 4);
    assert_eq!((info.spectators, info.performers), (0, 0));
    assert_eq!(settle(&relay).await.rooms, 1);
}

#[tokio::test]
async fn test_allocate_room_returns_distinct_codes() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let a = relay.allocate_room().await.unwrap();
    let b = relay.allocate_room().await.unwrap();

    assert_ne!(a, b);
}

#[tokio::test]
async fn test_room_info_unknown_room_returns_none() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    assert_eq!(relay.room_info(&code("NOPE")).await.unwrap(), None);
}

// ===========================================================================
// Presence
// ===========================================================================

#[tokio::test]
async fn test_join_broadcasts_presence_to_performers_only() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut performer = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let mut spectator = Client::join(&relay, 2, "WXYZ", Role::Spectator);
    settle(&relay).await;

    assert_eq!(performer.messages(), vec![presence(0, 1), presence(1, 1)]);
    assert!(spectator.frames().is_empty());
}

#[tokio::test]
async fn test_join_lowercase_code_joins_same_room() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut performer = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let _spectator = Client::join(&relay, 2, "wxyz", Role::Spectator);
    settle(&relay).await;

    assert_eq!(performer.messages(), vec![presence(0, 1), presence(1, 1)]);
}

#[tokio::test]
async fn test_leave_broadcasts_updated_presence() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut performer = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let spectator = Client::join(&relay, 2, "WXYZ", Role::Spectator);
    settle(&relay).await;
    performer.messages();

    relay.leave(spectator.id).unwrap();
    settle(&relay).await;

    assert_eq!(performer.messages(), vec![presence(0, 1)]);
}

#[tokio::test]
async fn test_leave_twice_is_noop() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut performer = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let spectator = Client::join(&relay, 2, "WXYZ", Role::Spectator);
    settle(&relay).await;
    performer.messages();

    relay.leave(spectator.id).unwrap();
    relay.leave(spectator.id).unwrap();
    settle(&relay).await;

    assert_eq!(performer.messages(), vec![presence(0, 1)]);
}

#[tokio::test]
async fn test_last_leave_removes_room() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let performer = Client::join(&relay, 1, "GONE", Role::Performer);
    assert!(relay.room_info(&code("GONE")).await.unwrap().is_some());

    relay.leave(performer.id).unwrap();

    assert_eq!(relay.room_info(&code("GONE")).await.unwrap(), None);
    assert_eq!(settle(&relay).await, RelayStats::default());
}

#[tokio::test]
async fn test_rejoin_after_teardown_starts_fresh() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let first = Client::join(&relay, 1, "GONE", Role::Spectator);
    relay.leave(first.id).unwrap();
    let mut performer = Client::join(&relay, 2, "GONE", Role::Performer);
    settle(&relay).await;

    assert_eq!(performer.messages(), vec![presence(0, 1)]);
}

#[tokio::test]
async fn test_duplicate_join_same_id_ignored() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut performer = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let _again = Client::join(&relay, 1, "WXYZ", Role::Spectator);
    let stats = settle(&relay).await;

    assert_eq!(stats.sessions, 1);
    assert_eq!(performer.messages(), vec![presence(0, 1)]);
}

// ===========================================================================
// Choice and clear
// ===========================================================================

#[tokio::test]
async fn test_spectator_choice_reaches_performers() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut performer = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let mut spectator = Client::join(&relay, 2, "WXYZ", Role::Spectator);
    spectator.send(&relay, r#"{"type":"choice","value":"red"}"#);
    settle(&relay).await;

    assert_eq!(
        performer.messages(),
        vec![presence(0, 1), presence(1, 1), choice("red")]
    );
    assert!(spectator.frames().is_empty(), "spectators never receive messages");
}

#[tokio::test]
async fn test_choice_reaches_every_performer() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut first = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let mut second = Client::join(&relay, 2, "WXYZ", Role::Performer);
    let spectator = Client::join(&relay, 3, "WXYZ", Role::Spectator);
    settle(&relay).await;
    first.messages();
    second.messages();

    spectator.send(&relay, r#"{"type":"choice","value":"left"}"#);
    settle(&relay).await;

    assert_eq!(first.messages(), vec![choice("left")]);
    assert_eq!(second.messages(), vec![choice("left")]);
}

#[tokio::test]
async fn test_choice_truncated_to_max_len() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut performer = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let spectator = Client::join(&relay, 2, "WXYZ", Role::Spectator);
    settle(&relay).await;
    performer.messages();

    let long = "x".repeat(500);
    spectator.send(&relay, &format!(r#"{{"type":"choice","value":"{long}"}}"#));
    settle(&relay).await;

    assert_eq!(performer.messages(), vec![choice(&"x".repeat(200))]);
}

#[tokio::test]
async fn test_choice_missing_value_forwarded_as_empty() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut performer = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let spectator = Client::join(&relay, 2, "WXYZ", Role::Spectator);
    settle(&relay).await;
    performer.messages();

    spectator.send(&relay, r#"{"type":"choice"}"#);
    settle(&relay).await;

    assert_eq!(performer.messages(), vec![choice("")]);
}

#[tokio::test]
async fn test_performer_choice_ignored() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut performer = Client::join(&relay, 1, "WXYZ", Role::Performer);
    settle(&relay).await;
    performer.messages();

    performer.send(&relay, r#"{"type":"choice","value":"red"}"#);
    settle(&relay).await;

    assert!(performer.messages().is_empty());
}

#[tokio::test]
async fn test_performer_clear_reaches_all_performers() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut first = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let mut second = Client::join(&relay, 2, "WXYZ", Role::Performer);
    let mut spectator = Client::join(&relay, 3, "WXYZ", Role::Spectator);
    settle(&relay).await;
    first.messages();
    second.messages();

    first.send(&relay, r#"{"type":"clear"}"#);
    settle(&relay).await;

    assert_eq!(first.messages(), vec![ServerMessage::Clear], "sender included");
    assert_eq!(second.messages(), vec![ServerMessage::Clear]);
    assert!(spectator.frames().is_empty());
}

#[tokio::test]
async fn test_spectator_clear_ignored() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut performer = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let spectator = Client::join(&relay, 2, "WXYZ", Role::Spectator);
    settle(&relay).await;
    performer.messages();

    spectator.send(&relay, r#"{"type":"clear"}"#);
    settle(&relay).await;

    assert!(performer.messages().is_empty());
}

#[tokio::test]
async fn test_malformed_payload_ignored_session_kept() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut performer = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let spectator = Client::join(&relay, 2, "WXYZ", Role::Spectator);
    settle(&relay).await;
    performer.messages();

    spectator.send(&relay, "not json");
    spectator.send(&relay, r#"{"type":"dance"}"#);
    spectator.send(&relay, r#"["choice"]"#);
    spectator.send(&relay, r#"{"type":"choice","value":"blue"}"#);
    let stats = settle(&relay).await;

    assert_eq!(stats.sessions, 2);
    assert_eq!(performer.messages(), vec![choice("blue")]);
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut here = Client::join(&relay, 1, "AAAA", Role::Performer);
    let mut there = Client::join(&relay, 2, "BBBB", Role::Performer);
    let spectator = Client::join(&relay, 3, "AAAA", Role::Spectator);
    settle(&relay).await;
    here.messages();
    there.messages();

    spectator.send(&relay, r#"{"type":"choice","value":"red"}"#);
    settle(&relay).await;

    assert_eq!(here.messages(), vec![choice("red")]);
    assert!(there.messages().is_empty());
}

#[tokio::test]
async fn test_closed_peer_skipped_during_fan_out() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let gone = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let mut alive = Client::join(&relay, 2, "WXYZ", Role::Performer);
    let spectator = Client::join(&relay, 3, "WXYZ", Role::Spectator);
    settle(&relay).await;
    alive.messages();
    drop(gone);

    spectator.send(&relay, r#"{"type":"choice","value":"red"}"#);
    settle(&relay).await;

    assert_eq!(alive.messages(), vec![choice("red")]);
}

#[tokio::test]
async fn test_inbound_from_unknown_connection_ignored() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut performer = Client::join(&relay, 1, "WXYZ", Role::Performer);
    settle(&relay).await;
    performer.messages();

    relay
        .inbound(ConnectionId::new(99), br#"{"type":"clear"}"#.to_vec())
        .unwrap();
    relay.pong(ConnectionId::new(99)).unwrap();
    settle(&relay).await;

    assert!(performer.messages().is_empty());
}

// ===========================================================================
// Liveness
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn test_sweep_pings_every_session() {
    let relay = spawn_relay(Duration::from_secs(30));

    let mut performer = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let mut spectator = Client::join(&relay, 2, "WXYZ", Role::Spectator);
    settle(&relay).await;
    performer.frames();

    tokio::time::sleep(Duration::from_secs(31)).await;
    settle(&relay).await;

    assert_eq!(performer.frames(), vec![Frame::Ping]);
    assert_eq!(spectator.frames(), vec![Frame::Ping]);
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_probe_evicts_and_updates_presence() {
    let relay = spawn_relay(Duration::from_secs(30));

    let mut performer = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let mut spectator = Client::join(&relay, 2, "WXYZ", Role::Spectator);
    settle(&relay).await;
    performer.frames();

    // First sweep: both probed. Only the performer answers.
    tokio::time::sleep(Duration::from_secs(31)).await;
    settle(&relay).await;
    performer.frames();
    spectator.frames();
    relay.pong(performer.id).unwrap();

    // Second sweep: the spectator is evicted, the performer probed again.
    tokio::time::sleep(Duration::from_secs(30)).await;
    let stats = settle(&relay).await;

    assert_eq!(spectator.frames(), vec![Frame::Terminate]);
    let frames = performer.frames();
    assert!(frames.contains(&Frame::Ping));
    let messages: Vec<ServerMessage> = frames
        .into_iter()
        .filter_map(|f| match f {
            Frame::Text(text) => serde_json::from_str(&text).ok(),
            _ => None,
        })
        .collect();
    assert_eq!(messages, vec![presence(0, 1)]);
    assert_eq!(stats.sessions, 1);
}

#[tokio::test(start_paused = true)]
async fn test_evicting_last_member_removes_room() {
    let relay = spawn_relay(Duration::from_secs(30));

    let _silent = Client::join(&relay, 1, "GONE", Role::Spectator);
    settle(&relay).await;

    tokio::time::sleep(Duration::from_secs(61)).await;

    assert_eq!(relay.room_info(&code("GONE")).await.unwrap(), None);
    assert_eq!(settle(&relay).await, RelayStats::default());
}

#[tokio::test(start_paused = true)]
async fn test_answering_every_probe_keeps_session() {
    let relay = spawn_relay(Duration::from_secs(30));

    let mut spectator = Client::join(&relay, 1, "WXYZ", Role::Spectator);
    settle(&relay).await;
    // Stay off the sweep instants.
    tokio::time::sleep(Duration::from_secs(1)).await;

    for _ in 0..5 {
        tokio::time::sleep(Duration::from_secs(30)).await;
        settle(&relay).await;
        assert_eq!(spectator.frames(), vec![Frame::Ping]);
        relay.pong(spectator.id).unwrap();
    }

    assert_eq!(settle(&relay).await.sessions, 1);
}

// ===========================================================================
// Shutdown
// ===========================================================================

#[tokio::test]
async fn test_shutdown_closes_sessions_going_away() {
    let relay = spawn_relay(LONG_HEARTBEAT);

    let mut performer = Client::join(&relay, 1, "WXYZ", Role::Performer);
    let mut spectator = Client::join(&relay, 2, "WXYZ", Role::Spectator);
    settle(&relay).await;
    performer.frames();

    relay.shutdown().unwrap();

    let expected = Frame::Close {
        code: 1001,
        reason: "server shutting down".to_string(),
    };
    assert_eq!(performer.rx.recv().await, Some(expected.clone()));
    assert_eq!(spectator.rx.recv().await, Some(expected));
    assert_eq!(performer.rx.recv().await, None, "queue closed after shutdown");
}

#[tokio::test]
async fn test_commands_after_shutdown_return_unavailable() {
    let relay = spawn_relay(LONG_HEARTBEAT);
    relay.shutdown().unwrap();

    let result = relay.stats().await;

    assert!(matches!(result, Err(StagecallError::RelayUnavailable)));
}
