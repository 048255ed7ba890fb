//! Real-time relay: connection registry, document rooms and the per-connection
//! session state machine.

pub mod error;
pub mod registry;
pub mod rooms;
pub mod session;

pub use error::RelayError;
pub use registry::{ConnectionHandle, ConnectionId, ConnectionRegistry, Outbox};
pub use rooms::{DocumentId, RoomManager};
pub use session::{Session, SessionState};
