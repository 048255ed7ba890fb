use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Invite a collaborator to a document
#[utoipa::path(
    post,
    path = "/api/sendmail",
    request_body = InviteRequest,
    responses(
        (status = 200, description = "Invitation mail sent", body = MessageResponse),
        (status = 400, description = "Caller is not the owner, or the target already has access", body = MessageResponse),
        (status = 500, description = "Token, document store or mail delivery failure", body = MessageResponse)
    )
)]
#[allow(dead_code)]
pub async fn send_invitation_doc() {}

/// Relay and process diagnostics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Current relay state", body = DiagnosticsResponse),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        send_invitation_doc,
        diagnostics_doc,
    ),
    components(
        schemas(HealthResponse, InviteRequest, MessageResponse, DiagnosticsResponse, RoomDiagnostics)
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;
