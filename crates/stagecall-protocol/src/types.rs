//! Wire types: roles and the closed set of messages in each direction.
//!
//! Everything here is JSON on the wire, internally tagged with `"type"`:
//!
//! ```text
//! client → relay   {"type":"choice","value":"red"}   {"type":"clear"}
//! relay → client   {"type":"presence","spectators":1,"performers":2}
//!                  {"type":"choice","value":"red"}   {"type":"clear"}
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Default cap on the length of a forwarded choice, in characters.
pub const MAX_CHOICE_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Which side of a room a connection is on. Fixed for the connection's
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Submits choices, receives nothing.
    Spectator,
    /// Receives choices, clears, and presence; may send clear.
    Performer,
}

impl Role {
    /// Returns the wire spelling of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spectator => "spectator",
            Self::Performer => "performer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsing is exact and case-sensitive: only `spectator` and `performer`.
impl FromStr for Role {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spectator" => Ok(Self::Spectator),
            "performer" => Ok(Self::Performer),
            other => Err(ProtocolError::UnknownRole(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// Member counts of one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Presence {
    pub spectators: usize,
    pub performers: usize,
}

impl From<Presence> for ServerMessage {
    fn from(p: Presence) -> Self {
        Self::Presence {
            spectators: p.spectators,
            performers: p.performers,
        }
    }
}

// ---------------------------------------------------------------------------
// Relay → client
// ---------------------------------------------------------------------------

/// Messages the relay sends. Only performers ever receive them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Current member counts of the performer's room.
    Presence { spectators: usize, performers: usize },

    /// A spectator's choice.
    Choice { value: String },

    /// A performer asked every performer to reset.
    Clear,
}

impl ServerMessage {
    /// Builds a choice message, keeping at most `max_len` characters of
    /// `value`. Excess characters are dropped silently.
    pub fn choice(value: &str, max_len: usize) -> Self {
        Self::Choice {
            value: value.chars().take(max_len).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Client → relay
// ---------------------------------------------------------------------------

/// Messages a client may send.
///
/// Decoding never fails: anything that isn't a recognizable `choice` or
/// `clear` becomes [`ClientMessage::Unrecognized`], which the relay ignores.
/// Role checks happen in the relay, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `{"type":"choice","value":...}` with `value` already coerced to text.
    Choice { value: String },

    /// `{"type":"clear"}`.
    Clear,

    /// Malformed payloads and unknown kinds.
    Unrecognized,
}

#[cfg(feature = "json")]
impl ClientMessage {
    /// Decodes an inbound payload.
    pub fn decode<C: crate::Codec>(codec: &C, data: &[u8]) -> Self {
        let value: serde_json::Value = match codec.decode(data) {
            Ok(v) => v,
            Err(_) => return Self::Unrecognized,
        };
        let Some(fields) = value.as_object() else {
            return Self::Unrecognized;
        };
        match fields.get("type").and_then(|t| t.as_str()) {
            Some("choice") => Self::Choice {
                value: coerce_text(fields.get("value")),
            },
            Some("clear") => Self::Clear,
            _ => Self::Unrecognized,
        }
    }
}

/// Coerces an arbitrary JSON value to the text a browser client would see:
/// missing and falsy values become `""`, everything else its string form.
#[cfg(feature = "json")]
fn coerce_text(value: Option<&serde_json::Value>) -> String {
    use serde_json::Value;

    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(v) => display_text(v),
    }
}

#[cfg(feature = "json")]
fn display_text(value: &serde_json::Value) -> String {
    use serde_json::Value;

    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e21 => {
                format!("{f:.0}")
            }
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_text)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
