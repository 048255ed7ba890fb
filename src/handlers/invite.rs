use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info, warn};

use crate::models::{InviteRequest, MessageResponse};
use crate::services::InviteError;
use crate::AppState;

/// Mail an invitation to collaborate on a document owned by the caller
pub async fn send_invitation(
    State(state): State<AppState>,
    payload: Result<Json<InviteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), (StatusCode, Json<MessageResponse>)> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected invitation request body: {}", rejection.body_text());
            return Err((
                StatusCode::BAD_REQUEST,
                Json(MessageResponse::new(format!(
                    "Invalid invitation request: {}",
                    rejection.body_text()
                ))),
            ));
        }
    };

    info!(
        "Invitation requested for document {} to {}",
        request.document_id, request.target_email
    );

    let gateway = match &state.invitations {
        Some(gateway) => gateway,
        None => {
            error!("Invitation requested but the gateway is not configured");
            return Err(error_response(&InviteError::NotConfigured));
        }
    };

    match gateway
        .invite(
            &request.token,
            &request.document_id,
            &request.target_email,
            &request.document_name,
        )
        .await
    {
        Ok(()) => Ok((StatusCode::OK, Json(MessageResponse::new("Email sent!")))),
        Err(e) => Err(error_response(&e)),
    }
}

fn error_response(e: &InviteError) -> (StatusCode, Json<MessageResponse>) {
    (e.status_code(), Json(MessageResponse::new(e.to_string())))
}
