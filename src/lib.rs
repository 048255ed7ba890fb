//! Real-time relay for a collaborative document editor.
//!
//! Clients join a room per document over a WebSocket and exchange opaque
//! edit deltas and advisory lock-status signals; an HTTP endpoint mails
//! invitations on behalf of a document's owner.

pub mod clients;
pub mod config;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod relay;
pub mod routes;
pub mod services;
pub mod utils;
pub mod websocket;

use std::sync::Arc;
use tracing::{error, warn};

use clients::{HttpDocumentStore, HttpMailer};
use config::Config;
use relay::{ConnectionRegistry, RoomManager};
use services::{IdentityVerifier, InvitationGateway, JwtIdentityVerifier};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
    pub verifier: Option<Arc<dyn IdentityVerifier>>,
    pub invitations: Option<Arc<InvitationGateway>>,
}

impl AppState {
    /// State with a fresh relay and no identity or invitation backends
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new(Arc::new(RoomManager::new()))),
            verifier: None,
            invitations: None,
        }
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn IdentityVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn with_invitations(mut self, gateway: Arc<InvitationGateway>) -> Self {
        self.invitations = Some(gateway);
        self
    }

    /// Wire up the external collaborators named in the configuration
    pub fn from_config(config: &Config) -> Self {
        let mut state = Self::new();

        let Some(secret) = &config.auth_jwt_secret else {
            warn!("No AUTH_JWT_SECRET configured - invitations and diagnostics will not be available");
            return state;
        };
        let verifier: Arc<dyn IdentityVerifier> = Arc::new(JwtIdentityVerifier::new(secret.clone()));
        state = state.with_verifier(verifier.clone());

        let (Some(store_url), Some(mail_url)) = (&config.document_store_url, &config.mail_api_url) else {
            warn!("Document store or mail API not configured - invitations will not be available");
            return state;
        };

        let store = match HttpDocumentStore::new(store_url, secret.clone(), config.service_name.clone()) {
            Ok(store) => store,
            Err(e) => {
                error!("Failed to set up document store client: {}", e);
                return state;
            }
        };
        let mailer = match HttpMailer::new(mail_url.clone(), config.mail_api_key.clone()) {
            Ok(mailer) => mailer,
            Err(e) => {
                error!("Failed to set up mail client: {}", e);
                return state;
            }
        };

        state.with_invitations(Arc::new(InvitationGateway::new(
            verifier,
            Arc::new(store),
            Arc::new(mailer),
            config.mail_from.clone(),
            config.app_url.clone(),
        )))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_state_has_no_backends() {
        let state = AppState::from_config(&Config::default());
        assert!(state.verifier.is_none());
        assert!(state.invitations.is_none());
    }

    #[test]
    fn full_configuration_builds_the_gateway() {
        let config = Config {
            auth_jwt_secret: Some("secret".into()),
            document_store_url: Some("http://store.test".into()),
            mail_api_url: Some("http://mail.test/send".into()),
            ..Config::default()
        };
        let state = AppState::from_config(&config);
        assert!(state.verifier.is_some());
        assert!(state.invitations.is_some());
    }

    #[test]
    fn secret_alone_enables_verification_only() {
        let config = Config {
            auth_jwt_secret: Some("secret".into()),
            ..Config::default()
        };
        let state = AppState::from_config(&config);
        assert!(state.verifier.is_some());
        assert!(state.invitations.is_none());
    }
}
