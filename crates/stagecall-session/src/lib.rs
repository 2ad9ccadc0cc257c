//! Connection sessions for Stagecall.
//!
//! This crate handles a connection's life around the relay:
//!
//! 1. **Admission**: validating the `room`/`role` parameters a client
//!    connects with ([`ConnectParams`] → [`Admission`])
//! 2. **Session tracking**: who is connected, to which room, as what
//!    ([`Session`])
//! 3. **Liveness**: probing connections and picking the ones to evict
//!    ([`LivenessMonitor`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Relay (above)  ← owns sessions and the liveness monitor
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol + Transport (below)  ← RoomCode, Role, ConnectionId, PeerSender
//! ```

mod admission;
mod error;
mod liveness;
mod session;

pub use admission::{Admission, ConnectParams};
pub use error::SessionError;
pub use liveness::{LivenessMonitor, LivenessState, Sweep};
pub use session::Session;
