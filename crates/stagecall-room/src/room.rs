//! A single room's membership.

use std::collections::HashSet;

use stagecall_protocol::{Presence, Role};
use stagecall_transport::ConnectionId;

/// Two disjoint sets of connections, one per [`Role`].
///
/// A room only tracks membership. It doesn't own sockets and doesn't know
/// its own code; the [`RoomRegistry`](crate::RoomRegistry) keys it.
#[derive(Debug, Clone, Default)]
pub struct Room {
    spectators: HashSet<ConnectionId>,
    performers: HashSet<ConnectionId>,
}

impl Room {
    /// Creates an empty room.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection under `role`.
    ///
    /// Returns the role the connection already holds if it is a member
    /// (in either set); the room is left unchanged in that case.
    pub fn insert(&mut self, id: ConnectionId, role: Role) -> Result<(), Role> {
        if let Some(existing) = self.role_of(id) {
            return Err(existing);
        }
        self.set_mut(role).insert(id);
        Ok(())
    }

    /// Removes a connection from the `role` set. Returns `true` if it was there.
    pub fn remove(&mut self, id: ConnectionId, role: Role) -> bool {
        self.set_mut(role).remove(&id)
    }

    /// Returns the role `id` holds in this room, if any.
    pub fn role_of(&self, id: ConnectionId) -> Option<Role> {
        if self.spectators.contains(&id) {
            Some(Role::Spectator)
        } else if self.performers.contains(&id) {
            Some(Role::Performer)
        } else {
            None
        }
    }

    /// Iterates over the members holding `role`, in no particular order.
    pub fn members(&self, role: Role) -> impl Iterator<Item = ConnectionId> + '_ {
        self.set(role).iter().copied()
    }

    pub fn spectator_count(&self) -> usize {
        self.spectators.len()
    }

    pub fn performer_count(&self) -> usize {
        self.performers.len()
    }

    /// Total members across both roles.
    pub fn len(&self) -> usize {
        self.spectators.len() + self.performers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectators.is_empty() && self.performers.is_empty()
    }

    /// Current member counts.
    pub fn presence(&self) -> Presence {
        Presence {
            spectators: self.spectator_count(),
            performers: self.performer_count(),
        }
    }

    fn set(&self, role: Role) -> &HashSet<ConnectionId> {
        match role {
            Role::Spectator => &self.spectators,
            Role::Performer => &self.performers,
        }
    }

    fn set_mut(&mut self, role: Role) -> &mut HashSet<ConnectionId> {
        match role {
            Role::Spectator => &mut self.spectators,
            Role::Performer => &mut self.performers,
        }
    }
}
