//! Document rooms: which connections currently view a document.
//!
//! The outer map is only held long enough to look up or insert a room. Every
//! membership change and every fan-out then runs under that room's own lock,
//! so rooms never block each other and all members of one room observe its
//! broadcasts in the same order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::registry::{ConnectionHandle, ConnectionId};
use crate::models::SendMessage;

pub type DocumentId = String;

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct Room {
    members: HashMap<ConnectionId, ConnectionHandle>,
    /// Set when the last member left; a closed room is already unlinked from the map.
    closed: bool,
}

pub struct RoomManager {
    rooms: Mutex<HashMap<DocumentId, Arc<Mutex<Room>>>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Add a connection to the room for `document_id`, creating the room if needed.
    ///
    /// Returns false if the connection was already a member.
    pub fn join(&self, document_id: &str, connection: &ConnectionHandle) -> bool {
        loop {
            let room = lock(&self.rooms)
                .entry(document_id.to_string())
                .or_insert_with(|| {
                    debug!("Creating room for document {}", document_id);
                    Arc::new(Mutex::new(Room::default()))
                })
                .clone();

            let mut room = lock(&room);
            // Lost a race with the last member leaving; the map now holds a fresh room.
            if room.closed {
                continue;
            }
            if room.members.contains_key(&connection.id) {
                return false;
            }
            room.members.insert(connection.id, connection.clone());
            debug!(
                "Connection {} joined document {} ({} members)",
                connection.id,
                document_id,
                room.members.len()
            );
            return true;
        }
    }

    /// Remove a connection from the room, deleting the room once it is empty.
    ///
    /// Returns false if the connection was not a member.
    pub fn leave(&self, document_id: &str, connection_id: ConnectionId) -> bool {
        let Some(room) = self.room(document_id) else {
            return false;
        };

        let mut guard = lock(&room);
        let removed = guard.members.remove(&connection_id).is_some();
        if guard.members.is_empty() && !guard.closed {
            guard.closed = true;
            let mut rooms = lock(&self.rooms);
            if rooms
                .get(document_id)
                .is_some_and(|current| Arc::ptr_eq(current, &room))
            {
                rooms.remove(document_id);
                debug!("Removed empty room for document {}", document_id);
            }
        }
        if removed {
            debug!("Connection {} left document {}", connection_id, document_id);
        }
        removed
    }

    /// Deliver `payload` to every member of the room except `sender`.
    ///
    /// Returns the number of members the payload was queued for.
    pub fn broadcast(&self, document_id: &str, sender: ConnectionId, payload: SendMessage) -> usize {
        let Some(room) = self.room(document_id) else {
            return 0;
        };

        let guard = lock(&room);
        let mut delivered = 0;
        for (id, member) in guard.members.iter() {
            if *id == sender {
                continue;
            }
            if member.send(payload.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Snapshot of the members of a room, empty if the room does not exist.
    pub fn members_of(&self, document_id: &str) -> Vec<ConnectionId> {
        match self.room(document_id) {
            Some(room) => lock(&room).members.keys().copied().collect(),
            None => Vec::new(),
        }
    }

    pub fn contains(&self, document_id: &str) -> bool {
        lock(&self.rooms).contains_key(document_id)
    }

    pub fn room_count(&self) -> usize {
        lock(&self.rooms).len()
    }

    pub fn documents(&self) -> Vec<DocumentId> {
        lock(&self.rooms).keys().cloned().collect()
    }

    fn room(&self, document_id: &str) -> Option<Arc<Mutex<Room>>> {
        lock(&self.rooms).get(document_id).cloned()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
