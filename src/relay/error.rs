use super::registry::ConnectionId;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A frame that is not a valid client message
    #[error("malformed frame: {0}")]
    Framing(String),
    /// The transport failed underneath the session
    #[error("channel error: {0}")]
    Channel(String),
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),
}
