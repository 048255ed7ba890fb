use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{error, info};

use crate::services::identity::get_auth_token;
use crate::AppState;

/// Require a verified bearer identity token and expose it to handlers as `Extension<Identity>`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = match get_auth_token(&req) {
        Ok(token) => token,
        Err(e) => {
            info!("Rejected request without token: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let verifier = match &state.verifier {
        Some(verifier) => verifier,
        None => {
            error!("Identity verification is not configured");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let identity = match verifier.verify(&token).await {
        Ok(identity) => identity,
        Err(e) => {
            error!("Token validation failed: {:?}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
