//! WebSocket connection over an upgraded `axum` socket.

use axum::body::Bytes;
use axum::extract::ws::{CloseFrame, Message, WebSocket};

use crate::{Connection, ConnectionId, Frame, Inbound, TransportError};

/// A single upgraded WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    socket: WebSocket,
}

impl WebSocketConnection {
    /// Wraps an upgraded socket and assigns it a fresh [`ConnectionId`].
    pub fn new(socket: WebSocket) -> Self {
        let id = ConnectionId::next();
        tracing::debug!(%id, "accepted WebSocket connection");
        Self { id, socket }
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&mut self, frame: Frame) -> Result<(), Self::Error> {
        let msg = match frame {
            Frame::Text(text) => Message::Text(text.into()),
            Frame::Ping => Message::Ping(Bytes::new()),
            Frame::Close { code, reason } => Message::Close(Some(CloseFrame {
                code,
                reason: reason.into(),
            })),
            Frame::Terminate => return Ok(()),
        };
        self.socket.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&mut self) -> Result<Option<Inbound>, Self::Error> {
        loop {
            match self.socket.recv().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Inbound::Data(text.as_str().as_bytes().to_vec())));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(Inbound::Data(data.to_vec())));
                }
                Some(Ok(Message::Pong(_))) => return Ok(Some(Inbound::Pong)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // axum answers client pings itself
                Some(Ok(Message::Ping(_))) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
