//! Admission: turning raw connect parameters into a room and a role.

use stagecall_protocol::{Role, RoomCode};

use crate::SessionError;

/// Query parameters a client connects with: `?room=WXYZ&role=performer`.
///
/// Both are optional here so that a missing parameter is reported as an
/// admission failure, not a malformed request.
#[derive(Debug, Clone, Default)]
pub struct ConnectParams {
    pub room: Option<String>,
    pub role: Option<String>,
}

/// A validated connection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// Upper-cased room code.
    pub room: RoomCode,
    pub role: Role,
}

impl ConnectParams {
    /// Builds parameters from raw query pairs. A repeated key keeps its
    /// first value; unknown keys are skipped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "room" => &mut params.room,
                "role" => &mut params.role,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        params
    }

    /// Validates the parameters.
    ///
    /// # Errors
    /// - [`SessionError::MissingRoom`]: `room` absent or empty
    /// - [`SessionError::MissingRole`]: `role` absent
    /// - [`SessionError::InvalidRole`]: `role` not `spectator`/`performer`
    pub fn admit(&self) -> Result<Admission, SessionError> {
        let room = self
            .room
            .as_deref()
            .ok_or(SessionError::MissingRoom)
            .and_then(|raw| RoomCode::parse(raw).map_err(|_| SessionError::MissingRoom))?;

        let raw_role = self.role.as_deref().ok_or(SessionError::MissingRole)?;
        let role = raw_role
            .parse::<Role>()
            .map_err(|_| SessionError::InvalidRole(raw_role.to_string()))?;

        Ok(Admission { room, role })
    }
}
