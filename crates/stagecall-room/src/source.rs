//! Sources of candidate room codes.

use stagecall_protocol::RoomCode;

/// Produces candidate codes for [`RoomRegistry::allocate`](crate::RoomRegistry::allocate).
///
/// Candidates need not be unique; the registry keeps drawing until one is
/// free.
pub trait CodeSource: Send + 'static {
    /// Returns the next candidate code.
    fn next_code(&mut self) -> RoomCode;
}

/// Uniformly random codes from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodes;

impl CodeSource for RandomCodes {
    fn next_code(&mut self) -> RoomCode {
        RoomCode::random(&mut rand::rng())
    }
}

