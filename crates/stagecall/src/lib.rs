//! # Stagecall
//!
//! Ephemeral room relay: spectators send choices, performers receive them.
//!
//! Clients join a short-lived room by code, as either a spectator or a
//! performer. Spectator choices and performer clears are fanned out to the
//! room's performers, who also get presence counts whenever membership
//! changes. Rooms vanish when their last member leaves; nothing is
//! persisted.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stagecall::prelude::*;
//!
//! # async fn run() -> Result<(), StagecallError> {
//! let server = StagecallServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! ## Endpoints
//!
//! - `GET /api/new-room` → `{"code":"WXYZ"}`
//! - `GET /health` → `OK`
//! - `GET /ws?room=WXYZ&role=spectator|performer` → WebSocket

mod config;
mod error;
mod handler;
mod relay;
mod server;

pub use config::{DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_PORT, RelayConfig};
pub use error::StagecallError;
pub use relay::{RelayHandle, RelayStats, RoomInfo};
pub use server::{StagecallServer, StagecallServerBuilder};

pub mod prelude {
    pub use crate::{
        RelayConfig, RelayHandle, RelayStats, RoomInfo, StagecallError, StagecallServer,
        StagecallServerBuilder,
    };
    pub use stagecall_protocol::{ClientMessage, Role, RoomCode, ServerMessage};
    pub use stagecall_session::{Admission, ConnectParams};
    pub use stagecall_transport::{ConnectionId, Frame, PeerSender};
}
