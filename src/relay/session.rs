use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::RelayError;
use super::registry::{ConnectionHandle, ConnectionId, ConnectionRegistry, Outbox};
use super::rooms::DocumentId;
use crate::models::{PongMessage, ReceivedMessage, RequestDocumentMessage, SendMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingDocument,
    Active(DocumentId),
    Closed,
}

/// Protocol state of one client connection.
///
/// The session is transport agnostic: frames go out through the connection's
/// outbox and inbound frames are fed in with [`Session::handle`].
pub struct Session {
    registry: Arc<ConnectionRegistry>,
    connection: Option<ConnectionHandle>,
    state: SessionState,
}

impl Session {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            connection: None,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection.as_ref().map(|c| c.id)
    }

    /// Register the connection and start waiting for a document request.
    pub fn open(&mut self, outbox: Outbox) -> ConnectionId {
        if let Some(connection) = &self.connection {
            return connection.id;
        }
        let connection = self.registry.register(outbox);
        let id = connection.id;
        self.connection = Some(connection);
        self.state = SessionState::AwaitingDocument;
        id
    }

    pub fn handle(&mut self, msg: ReceivedMessage) -> Result<(), RelayError> {
        let connection = match (&self.state, &self.connection) {
            (SessionState::Closed, _) | (SessionState::Idle, _) | (_, None) => {
                debug!("Dropping {:?} received outside an open session", msg);
                return Ok(());
            }
            (_, Some(connection)) => connection.clone(),
        };

        match msg {
            ReceivedMessage::RequestDocument(request) => self.request_document(&connection, request),
            ReceivedMessage::SubmitDelta(delta) => {
                self.forward(&connection, SendMessage::DeltaReceived(delta));
                Ok(())
            }
            ReceivedMessage::SubmitLockStatus(status) => {
                self.forward(&connection, SendMessage::LockStatusChanged(status));
                Ok(())
            }
            ReceivedMessage::Ping => {
                let pong = SendMessage::Pong(PongMessage {
                    date: Utc::now().to_rfc3339(),
                });
                if !connection.send(pong) {
                    warn!("Failed to queue pong for connection {}", connection.id);
                }
                Ok(())
            }
        }
    }

    /// Leave the active room and unregister. Safe to call more than once.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if let Some(connection) = self.connection.take() {
            if let SessionState::Active(document_id) = &self.state {
                self.registry.leave(connection.id, document_id);
            }
            self.registry.unregister(connection.id);
            info!("Session for connection {} closed", connection.id);
        }
        self.state = SessionState::Closed;
    }

    fn request_document(
        &mut self,
        connection: &ConnectionHandle,
        request: RequestDocumentMessage,
    ) -> Result<(), RelayError> {
        if let SessionState::Active(current) = &self.state {
            info!(
                "Connection {} switching from document {} to {}",
                connection.id, current, request.document_id
            );
            self.registry.leave(connection.id, current);
            self.state = SessionState::AwaitingDocument;
        }

        self.registry.join(connection.id, &request.document_id)?;
        info!("Connection {} joined document {}", connection.id, request.document_id);
        self.state = SessionState::Active(request.document_id);

        if !connection.send(SendMessage::DocumentReady) {
            warn!("Failed to queue document-ready for connection {}", connection.id);
        }
        Ok(())
    }

    fn forward(&self, connection: &ConnectionHandle, payload: SendMessage) {
        let SessionState::Active(document_id) = &self.state else {
            debug!(
                "Connection {} has no active document, ignoring {:?}",
                connection.id, payload
            );
            return;
        };
        let delivered = self
            .registry
            .rooms()
            .broadcast(document_id, connection.id, payload);
        debug!(
            "Relayed frame from {} on document {} to {} member(s)",
            connection.id, document_id, delivered
        );
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeltaMessage, LockStatusMessage};
    use crate::relay::RoomManager;
    use serde_json::json;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn registry() -> Arc<ConnectionRegistry> {
        Arc::new(ConnectionRegistry::new(Arc::new(RoomManager::new())))
    }

    fn open(registry: &Arc<ConnectionRegistry>) -> (Session, UnboundedReceiver<SendMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut session = Session::new(registry.clone());
        session.open(tx);
        (session, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<SendMessage>) -> Vec<SendMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn session_walks_through_its_states() {
        let registry = registry();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = Session::new(registry.clone());
        assert_eq!(session.state(), &SessionState::Idle);

        session.open(tx);
        assert_eq!(session.state(), &SessionState::AwaitingDocument);

        session.handle(ReceivedMessage::request_document("doc1")).unwrap();
        assert_eq!(session.state(), &SessionState::Active("doc1".into()));

        session.close();
        assert_eq!(session.state(), &SessionState::Closed);
        assert_eq!(registry.connection_count(), 0);
        assert!(!registry.rooms().contains("doc1"));
    }

    #[test]
    fn two_editors_exchange_deltas() {
        let registry = registry();
        let (mut c1, mut r1) = open(&registry);
        let (mut c2, mut r2) = open(&registry);

        c1.handle(ReceivedMessage::request_document("doc1")).unwrap();
        c2.handle(ReceivedMessage::request_document("doc1")).unwrap();
        assert_eq!(drain(&mut r1), vec![SendMessage::DocumentReady]);
        assert_eq!(drain(&mut r2), vec![SendMessage::DocumentReady]);

        c1.handle(ReceivedMessage::delta(json!({"ops": [{"insert": "a"}]}))).unwrap();
        assert_eq!(
            drain(&mut r2),
            vec![SendMessage::DeltaReceived(DeltaMessage {
                delta: json!({"ops": [{"insert": "a"}]})
            })]
        );
        assert!(drain(&mut r1).is_empty());

        c2.close();
        c1.handle(ReceivedMessage::delta(json!("D2"))).unwrap();
        assert!(drain(&mut r1).is_empty());
        assert_eq!(registry.rooms().members_of("doc1"), vec![c1.connection_id().unwrap()]);
    }

    #[test]
    fn lock_status_is_relayed_verbatim() {
        let registry = registry();
        let (mut c1, mut r1) = open(&registry);
        let (mut c2, mut r2) = open(&registry);
        c1.handle(ReceivedMessage::request_document("doc")).unwrap();
        c2.handle(ReceivedMessage::request_document("doc")).unwrap();
        drain(&mut r1);
        drain(&mut r2);

        c2.handle(ReceivedMessage::lock_status(json!(true))).unwrap();
        assert_eq!(
            drain(&mut r1),
            vec![SendMessage::LockStatusChanged(LockStatusMessage { status: json!(true) })]
        );
        assert!(drain(&mut r2).is_empty());
    }

    #[test]
    fn edits_before_a_document_request_are_ignored() {
        let registry = registry();
        let (mut c1, mut r1) = open(&registry);
        let (mut c2, mut r2) = open(&registry);
        c2.handle(ReceivedMessage::request_document("doc")).unwrap();
        drain(&mut r2);

        c1.handle(ReceivedMessage::delta(json!(1))).unwrap();
        c1.handle(ReceivedMessage::lock_status(json!(false))).unwrap();
        assert_eq!(c1.state(), &SessionState::AwaitingDocument);
        assert!(drain(&mut r1).is_empty());
        assert!(drain(&mut r2).is_empty());
    }

    #[test]
    fn ready_goes_only_to_the_requester() {
        let registry = registry();
        let (mut c1, mut r1) = open(&registry);
        let (mut c2, mut r2) = open(&registry);
        c1.handle(ReceivedMessage::request_document("doc")).unwrap();
        drain(&mut r1);

        c2.handle(ReceivedMessage::request_document("doc")).unwrap();
        assert!(drain(&mut r1).is_empty());
        assert_eq!(drain(&mut r2), vec![SendMessage::DocumentReady]);
    }

    #[test]
    fn switching_documents_leaves_the_previous_room() {
        let registry = registry();
        let (mut c1, mut r1) = open(&registry);
        let (mut c2, mut r2) = open(&registry);
        c1.handle(ReceivedMessage::request_document("A")).unwrap();
        c2.handle(ReceivedMessage::request_document("A")).unwrap();

        c1.handle(ReceivedMessage::request_document("B")).unwrap();
        assert_eq!(drain(&mut r1), vec![SendMessage::DocumentReady, SendMessage::DocumentReady]);
        assert_eq!(c1.state(), &SessionState::Active("B".into()));
        assert_eq!(registry.rooms().members_of("A"), vec![c2.connection_id().unwrap()]);

        c1.handle(ReceivedMessage::delta(json!("only B"))).unwrap();
        drain(&mut r2);
        c2.handle(ReceivedMessage::delta(json!("only A"))).unwrap();
        assert!(drain(&mut r1).is_empty());
    }

    #[test]
    fn closed_sessions_process_nothing() {
        let registry = registry();
        let (mut c1, mut r1) = open(&registry);
        c1.handle(ReceivedMessage::request_document("doc")).unwrap();
        c1.close();
        drain(&mut r1);

        c1.handle(ReceivedMessage::request_document("doc")).unwrap();
        c1.handle(ReceivedMessage::Ping).unwrap();
        assert!(drain(&mut r1).is_empty());
        assert!(!registry.rooms().contains("doc"));

        c1.close();
        assert_eq!(c1.state(), &SessionState::Closed);
    }

    #[test]
    fn ping_is_answered_in_any_open_state() {
        let registry = registry();
        let (mut c1, mut r1) = open(&registry);
        c1.handle(ReceivedMessage::Ping).unwrap();
        assert!(matches!(drain(&mut r1).as_slice(), [SendMessage::Pong(_)]));
    }

    #[test]
    fn dropping_a_session_tears_it_down() {
        let registry = registry();
        let (mut c1, _r1) = open(&registry);
        c1.handle(ReceivedMessage::request_document("doc")).unwrap();
        drop(c1);

        assert_eq!(registry.connection_count(), 0);
        assert!(!registry.rooms().contains("doc"));
    }

    #[test]
    fn unregistered_connection_cannot_join() {
        let registry = registry();
        let (mut c1, _r1) = open(&registry);
        registry.unregister(c1.connection_id().unwrap());

        let err = c1.handle(ReceivedMessage::request_document("doc")).unwrap_err();
        assert!(matches!(err, RelayError::UnknownConnection(_)));
        assert!(!registry.rooms().contains("doc"));
    }
}
