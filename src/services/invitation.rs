use axum::http::StatusCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::identity::{Identity, IdentityVerifier};
use crate::clients::document_store_client::DocumentStore;
use crate::clients::mail_client::{MailMessage, Mailer};

#[derive(Debug, thiserror::Error)]
pub enum InviteError {
    #[error("Error in validating token")]
    InvalidToken(String),
    #[error("Document '{0}' not found")]
    DocumentNotFound(String),
    #[error("User is not allowed to add/remove users")]
    NotOwner,
    #[error("Target user already has access to the document")]
    AlreadyInvited,
    #[error("Error while sending email to user")]
    DeliveryError(String),
    #[error("Error while reading the document: {0}")]
    Store(String),
    #[error("Invitation service is not configured")]
    NotConfigured,
}

impl InviteError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            InviteError::NotOwner | InviteError::AlreadyInvited => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Checks that the caller owns a document before mailing an invitation for it.
///
/// The document's allow-list is only read here, never updated.
pub struct InvitationGateway {
    verifier: Arc<dyn IdentityVerifier>,
    store: Arc<dyn DocumentStore>,
    mailer: Arc<dyn Mailer>,
    mail_from: String,
    app_url: String,
}

impl InvitationGateway {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        store: Arc<dyn DocumentStore>,
        mailer: Arc<dyn Mailer>,
        mail_from: String,
        app_url: String,
    ) -> Self {
        Self {
            verifier,
            store,
            mailer,
            mail_from,
            app_url,
        }
    }

    pub async fn invite(
        &self,
        token: &str,
        document_id: &str,
        target_email: &str,
        document_name: &str,
    ) -> Result<(), InviteError> {
        let identity = self.verifier.verify(token).await.map_err(|e| {
            warn!("Rejected invitation for document {}: {:?}", document_id, e);
            e
        })?;

        let document = self.store.get_document(document_id).await?;
        if document.owner != identity.email {
            info!(
                "{} tried to invite to document {} owned by someone else",
                identity.email, document_id
            );
            return Err(InviteError::NotOwner);
        }
        if document.allowed.contains(target_email) {
            return Err(InviteError::AlreadyInvited);
        }

        let message = self.invitation_mail(&identity, document_id, target_email, document_name);
        if let Err(e) = self.mailer.send(message).await {
            error!("Invitation mail for document {} to {} failed: {:?}", document_id, target_email, e);
            return Err(e);
        }

        info!("{} invited {} to document {}", identity.email, target_email, document_id);
        Ok(())
    }

    fn invitation_mail(
        &self,
        inviter: &Identity,
        document_id: &str,
        target_email: &str,
        document_name: &str,
    ) -> MailMessage {
        let link = format!("{}/document/{}", self.app_url.trim_end_matches('/'), document_id);
        let html = format!(
            "Hello,<br>\n\
             <span> You have been invited to collaborate on the following document: <i>{}</i> by {}\n\
             <br> <br>\n\
             You can access the document at this <a href='{}'>link</a>\n",
            escape_html(document_name),
            escape_html(&inviter.name),
            escape_html(&link),
        );

        MailMessage {
            from: self.mail_from.clone(),
            to: target_email.to_string(),
            subject: format!("Invitation to view/edit document: {}", document_name),
            html,
        }
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
