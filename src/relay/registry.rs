use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::RelayError;
use super::rooms::{lock, DocumentId, RoomManager};
use crate::models::SendMessage;

/// Outbound queue feeding one client's socket writer
pub type Outbox = mpsc::UnboundedSender<SendMessage>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A live connection: its identifier plus the queue its frames are written to.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    outbox: Outbox,
}

impl ConnectionHandle {
    pub fn new(outbox: Outbox) -> Self {
        Self {
            id: ConnectionId::generate(),
            outbox,
        }
    }

    /// Queue a frame for this connection. Returns false once the socket writer is gone.
    pub fn send(&self, msg: SendMessage) -> bool {
        self.outbox.send(msg).is_ok()
    }
}

struct ConnectionRecord {
    handle: ConnectionHandle,
    rooms: HashSet<DocumentId>,
}

/// Owns every live connection and the set of rooms each one has joined.
///
/// Room membership changes go through the registry so that `unregister` can
/// always find and leave every room the connection is in.
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, ConnectionRecord>>,
    rooms: Arc<RoomManager>,
}

impl ConnectionRegistry {
    pub fn new(rooms: Arc<RoomManager>) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            rooms,
        }
    }

    pub fn rooms(&self) -> &Arc<RoomManager> {
        &self.rooms
    }

    pub fn register(&self, outbox: Outbox) -> ConnectionHandle {
        let mut connections = lock(&self.connections);
        let mut handle = ConnectionHandle::new(outbox.clone());
        while connections.contains_key(&handle.id) {
            handle = ConnectionHandle::new(outbox.clone());
        }
        let id = handle.id;
        connections.insert(
            id,
            ConnectionRecord {
                handle: handle.clone(),
                rooms: HashSet::new(),
            },
        );
        info!("Connection {} registered ({} live)", id, connections.len());
        handle
    }

    /// Add the connection to the room for `document_id`.
    ///
    /// Returns `Ok(false)` when the connection was already a member.
    pub fn join(&self, id: ConnectionId, document_id: &str) -> Result<bool, RelayError> {
        let mut connections = lock(&self.connections);
        let record = connections
            .get_mut(&id)
            .ok_or(RelayError::UnknownConnection(id))?;
        record.rooms.insert(document_id.to_string());
        Ok(self.rooms.join(document_id, &record.handle))
    }

    /// Remove the connection from one room. Unknown connections and rooms are ignored.
    pub fn leave(&self, id: ConnectionId, document_id: &str) -> bool {
        let mut connections = lock(&self.connections);
        if let Some(record) = connections.get_mut(&id) {
            record.rooms.remove(document_id);
        }
        self.rooms.leave(document_id, id)
    }

    /// Drop the connection and leave every room it belongs to.
    ///
    /// Returns false when the connection was already gone.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let mut connections = lock(&self.connections);
        let Some(record) = connections.remove(&id) else {
            debug!("Connection {} already unregistered", id);
            return false;
        };
        for document_id in &record.rooms {
            self.rooms.leave(document_id, id);
        }
        info!(
            "Connection {} unregistered from {} room(s) ({} live)",
            id,
            record.rooms.len(),
            connections.len()
        );
        true
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        lock(&self.connections).contains_key(&id)
    }

    pub fn connection_count(&self) -> usize {
        lock(&self.connections).len()
    }

    pub fn rooms_of(&self, id: ConnectionId) -> Vec<DocumentId> {
        lock(&self.connections)
            .get(&id)
            .map(|record| record.rooms.iter().cloned().collect())
            .unwrap_or_default()
    }
}
