use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::models::{ReceivedMessage, SendMessage};
use crate::relay::{ConnectionRegistry, RelayError, Session};
use crate::utils::scope_guard::ScopeGuard;
use crate::AppState;

/// WebSocket handler
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    info!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, state.registry))
}

/// Drive one client connection from upgrade to teardown
async fn handle_socket(socket: WebSocket, registry: Arc<ConnectionRegistry>) {
    let (mut sender, mut receiver) = socket.split();

    let (outbox, mut inbox) = mpsc::unbounded_channel::<SendMessage>();
    let mut session = Session::new(registry.clone());
    let connection_id = session.open(outbox);
    info!("WebSocket connection established with connection_id: {}", connection_id);

    // Leave rooms and unregister however this function is exited.
    let _teardown = ScopeGuard::new({
        let registry = registry.clone();
        move || {
            registry.unregister(connection_id);
        }
    });

    // Writer: drains the outbox until every clone of it (session, registry, rooms) is gone.
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = inbox.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize {:?}: {}", msg, e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                return;
            }
        }
        let _ = sender.close().await;
    });

    let (result, writer_done) = tokio::select! {
        result = read_frames(&mut receiver, &mut session) => (result, false),
        _ = &mut send_task => (Err(RelayError::Channel("socket writer stopped".to_string())), true),
    };

    match &result {
        Ok(()) => info!("Connection {} closed by client", connection_id),
        Err(RelayError::Framing(reason)) => {
            warn!("Closing connection {} after malformed frame: {}", connection_id, reason)
        }
        Err(e) => info!("Connection {} dropped: {}", connection_id, e),
    }

    session.close();
    if !writer_done {
        if let Err(e) = send_task.await {
            error!("Socket writer for {} failed: {}", connection_id, e);
        }
    }
    info!("WebSocket connection terminated");
}

/// Feed inbound frames to the session until the client goes away or misbehaves
async fn read_frames(
    receiver: &mut SplitStream<WebSocket>,
    session: &mut Session,
) -> Result<(), RelayError> {
    while let Some(frame) = receiver.next().await {
        let frame = frame.map_err(|e| RelayError::Channel(e.to_string()))?;
        match frame {
            Message::Text(text) => {
                let msg: ReceivedMessage = serde_json::from_str(&text)
                    .map_err(|e| RelayError::Framing(e.to_string()))?;
                debug!("Received {:?}", msg);
                session.handle(msg)?;
            }
            Message::Binary(_) => {
                return Err(RelayError::Framing("binary frames are not supported".to_string()));
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => break,
        }
    }
    Ok(())
}
