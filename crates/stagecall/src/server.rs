//! `StagecallServer` builder and HTTP surface.
//!
//! Ties the layers together: axum serves the HTTP routes and upgrades
//! `/ws` requests, and each upgraded socket is handed to the relay actor.

use std::future::Future;
use std::time::Duration;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use stagecall_protocol::RoomCode;
use tokio::net::TcpListener;

use crate::handler::ws_upgrade;
use crate::{RelayConfig, RelayHandle, StagecallError};

/// State shared by every route handler.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) relay: RelayHandle,
}

/// Body of `GET /api/new-room`.
#[derive(Debug, Serialize)]
struct NewRoom {
    code: RoomCode,
}

/// Builder for configuring and starting a Stagecall server.
///
/// # Example
///
/// ```rust,no_run
/// use stagecall::prelude::*;
/// use std::time::Duration;
///
/// # async fn run() -> Result<(), StagecallError> {
/// let server = StagecallServer::builder()
///     .bind("127.0.0.1:3000")
///     .heartbeat_interval(Duration::from_secs(10))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct StagecallServerBuilder {
    config: RelayConfig,
    bind_addr: Option<String>,
}

impl StagecallServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: RelayConfig::default(),
            bind_addr: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to, overriding the config's
    /// host and port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = Some(addr.to_string());
        self
    }

    /// Sets how often connections are probed.
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    /// Sets the longest choice forwarded to performers, in characters.
    pub fn max_choice_len(mut self, len: usize) -> Self {
        self.config.max_choice_len = len;
        self
    }

    /// Binds the listener and starts the relay actor.
    pub async fn build(self) -> Result<StagecallServer, StagecallError> {
        let addr = self
            .bind_addr
            .unwrap_or_else(|| self.config.bind_addr());
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| StagecallError::Bind {
                addr: addr.clone(),
                source,
            })?;
        tracing::info!(%addr, "listening");

        let relay = RelayHandle::spawn(&self.config);
        Ok(StagecallServer { listener, relay })
    }
}

impl Default for StagecallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Stagecall server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// serving.
pub struct StagecallServer {
    listener: TcpListener,
    relay: RelayHandle,
}

impl StagecallServer {
    /// Creates a new builder.
    pub fn builder() -> StagecallServerBuilder {
        StagecallServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns a handle to the relay actor.
    pub fn relay(&self) -> RelayHandle {
        self.relay.clone()
    }

    /// Serves until the process is terminated.
    pub async fn run(self) -> Result<(), StagecallError> {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `signal` completes, then closes every session with
    /// 1001 and stops accepting connections.
    pub async fn run_until<F>(self, signal: F) -> Result<(), StagecallError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let relay = self.relay.clone();
        let app = router(self.relay);

        tracing::info!("Stagecall server running");
        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                tracing::info!("shutting down");
                let _ = relay.shutdown();
            })
            .await
            .map_err(StagecallError::Serve)
    }
}

fn router(relay: RelayHandle) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/new-room", get(new_room))
        .route("/ws", get(ws_upgrade))
        .with_state(AppState { relay })
}

async fn health() -> &'static str {
    "OK"
}

async fn new_room(State(state): State<AppState>) -> Result<Json<NewRoom>, StagecallError> {
    let code = state.relay.allocate_room().await?;
    Ok(Json(NewRoom { code }))
}
