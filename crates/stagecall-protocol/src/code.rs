//! Room codes: short, human-typeable room identifiers.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::Serialize;

use crate::ProtocolError;

/// Symbols a generated code is drawn from. Excludes the look-alikes
/// `O`/`0`, `I`/`1`, and `L`.
pub const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Length of a generated code.
pub const CODE_LEN: usize = 4;

/// A normalized (upper-cased, non-empty) room code.
///
/// Codes typed by clients only have to be non-empty; generated codes are
/// always [`CODE_LEN`] symbols from [`ALPHABET`]. Serializes as a plain
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalizes a client-supplied code.
    ///
    /// # Errors
    /// Returns [`ProtocolError::EmptyRoomCode`] for an empty string.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        if raw.is_empty() {
            return Err(ProtocolError::EmptyRoomCode);
        }
        Ok(Self(raw.to_uppercase()))
    }

    /// Draws a code uniformly at random. Not unique by itself; the registry
    /// retries on collision.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..CODE_LEN)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
