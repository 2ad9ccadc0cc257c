//! Room registry for Stagecall.
//!
//! A room is a code plus two disjoint sets of connections: spectators and
//! performers. The [`RoomRegistry`] is the only thing that creates or
//! destroys rooms; everything else sees them through it.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: code → room map, allocation, teardown
//! - [`Room`]: role-partitioned membership
//! - [`CodeSource`]: where fresh codes come from ([`RandomCodes`] in production)

mod error;
mod registry;
mod room;
mod source;

pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::Room;
pub use source::{CodeSource, RandomCodes};
