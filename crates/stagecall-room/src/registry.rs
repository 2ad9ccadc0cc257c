//! Room registry: creates, tracks, and tears down rooms by code.

use std::collections::HashMap;

use stagecall_protocol::{Presence, Role, RoomCode};
use stagecall_transport::ConnectionId;

use crate::{CodeSource, RandomCodes, Room, RoomError};

/// Owns every room, keyed by normalized code.
///
/// Not thread-safe by itself: the relay actor owns the one instance and
/// all access goes through its command channel.
pub struct RoomRegistry<S: CodeSource = RandomCodes> {
    rooms: HashMap<RoomCode, Room>,
    source: S,
}

impl RoomRegistry {
    /// Creates an empty registry drawing random codes.
    pub fn new() -> Self {
        Self::with_source(RandomCodes)
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: CodeSource> RoomRegistry<S> {
    /// Creates an empty registry drawing candidate codes from `source`.
    pub fn with_source(source: S) -> Self {
        Self {
            rooms: HashMap::new(),
            source,
        }
    }

    /// Reserves a fresh code and inserts an empty room under it.
    ///
    /// Draws candidates until one is free. There is no retry cap: the code
    /// space is far larger than any realistic number of live rooms.
    pub fn allocate(&mut self) -> RoomCode {
        let mut attempts = 1u32;
        let code = loop {
            let candidate = self.source.next_code();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
            attempts += 1;
        };
        self.get_or_create(&code);
        tracing::info!(room = %code, attempts, "room allocated");
        code
    }

    /// Returns the room for `code`, creating an empty one if absent.
    pub fn get_or_create(&mut self, code: &RoomCode) -> &mut Room {
        self.rooms.entry(code.clone()).or_insert_with(|| {
            tracing::info!(room = %code, "room created");
            Room::new()
        })
    }

    /// Adds `id` to `code`'s room under `role`, creating the room if needed.
    ///
    /// Returns the post-join member counts.
    ///
    /// # Errors
    /// [`RoomError::AlreadyMember`] if `id` already holds a role there.
    pub fn join(
        &mut self,
        code: &RoomCode,
        id: ConnectionId,
        role: Role,
    ) -> Result<Presence, RoomError> {
        let room = self.get_or_create(code);
        room.insert(id, role)
            .map_err(|held| RoomError::AlreadyMember(id, held, code.clone()))?;
        Ok(room.presence())
    }

    /// Removes `id` from `code`'s room and prunes the room once it is empty.
    ///
    /// Returns `Ok(None)` if the room was removed, or the remaining member
    /// counts otherwise.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if no room exists under `code`.
    pub fn leave(
        &mut self,
        code: &RoomCode,
        id: ConnectionId,
        role: Role,
    ) -> Result<Option<Presence>, RoomError> {
        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        room.remove(id, role);

        if room.is_empty() {
            self.remove(code);
            return Ok(None);
        }
        Ok(Some(room.presence()))
    }

    /// Deletes the room under `code`. Removing an absent code is a no-op.
    pub fn remove(&mut self, code: &RoomCode) -> Option<Room> {
        let removed = self.rooms.remove(code);
        if removed.is_some() {
            tracing::info!(room = %code, "room removed");
        }
        removed
    }

    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    /// Returns the number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
