//! Per-connection handler: admission, then pumping frames both ways.
//!
//! Each upgraded socket gets its own Tokio task running this handler.
//! The flow is:
//!   1. Validate `room` and `role` → close with 1008 on failure
//!   2. Register with the relay actor
//!   3. Loop: forward inbound payloads and pongs to the relay, write the
//!      relay's outbound frames to the socket

use axum::extract::rejection::QueryRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::Response;
use stagecall_session::ConnectParams;
use stagecall_transport::{Connection, ConnectionId, Inbound, PeerSender, WebSocketConnection};

use crate::server::AppState;
use crate::{RelayHandle, StagecallError};

/// `GET /ws?room=..&role=..`
///
/// Parameters are validated after the upgrade so that a bad request is
/// answered with a WebSocket close frame, not an HTTP error. A repeated
/// parameter keeps its first value.
pub(crate) async fn ws_upgrade(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    ws: WebSocketUpgrade,
) -> Response {
    let params = query
        .map(|Query(pairs)| ConnectParams::from_pairs(pairs))
        .unwrap_or_default();
    ws.on_upgrade(move |socket| async move {
        let conn = WebSocketConnection::new(socket);
        let conn_id = conn.id();
        if let Err(e) = handle_connection(conn, params, state.relay).await {
            tracing::debug!(%conn_id, error = %e, "connection ended with error");
        }
    })
}

/// Drop guard that tells the relay the connection is gone.
///
/// Runs on every exit path, including errors and panics. The relay treats
/// a second leave for the same id as a no-op.
struct LeaveGuard {
    conn_id: ConnectionId,
    relay: RelayHandle,
}

impl Drop for LeaveGuard {
    fn drop(&mut self) {
        let _ = self.relay.leave(self.conn_id);
    }
}

/// Handles a single connection from upgrade to close.
pub(crate) async fn handle_connection(
    mut conn: WebSocketConnection,
    params: ConnectParams,
    relay: RelayHandle,
) -> Result<(), StagecallError> {
    let conn_id = conn.id();

    // --- Step 1: Admission ---
    let admission = match params.admit() {
        Ok(admission) => admission,
        Err(e) => {
            tracing::info!(%conn_id, reason = %e, "connection rejected");
            conn.close(e.close_code(), &e.to_string()).await?;
            return Err(e.into());
        }
    };

    // --- Step 2: Register ---
    let (peer, mut outbound) = PeerSender::channel(conn_id);
    relay.join(admission, peer)?;
    let _guard = LeaveGuard {
        conn_id,
        relay: relay.clone(),
    };

    // --- Step 3: Pump ---
    loop {
        tokio::select! {
            frame = outbound.recv() => {
                // The relay dropped our queue: the session is over.
                let Some(frame) = frame else { break };
                let terminal = frame.is_terminal();
                conn.send(frame).await?;
                if terminal {
                    break;
                }
            }
            inbound = conn.recv() => match inbound {
                Ok(Some(Inbound::Data(data))) => relay.inbound(conn_id, data)?,
                Ok(Some(Inbound::Pong)) => relay.pong(conn_id)?,
                Ok(None) => {
                    tracing::debug!(%conn_id, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    break;
                }
            },
        }
    }

    // _guard drops here → relay leave fires.
    Ok(())
}
