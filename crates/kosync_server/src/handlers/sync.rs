use crate::auth::{AuthGate, RequireAuth, require_accept_header};
use crate::error::SyncError;
use crate::protocol::{PushRequest, RegisterRequest};
use crate::service::{SyncService, decode_body};
use axum::{
    Extension, Router,
    body::Bytes,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post, put},
};
use serde_json::json;
use tracing::{debug, warn};

/// Shared state for sync handlers
#[derive(Clone)]
pub struct SyncState {
    pub service: SyncService,
}

/// Create the sync protocol routes.
///
/// Every route, including the health check, requires the protocol Accept
/// header. Authenticated routes check credentials through `auth_gate`.
pub fn sync_routes(state: SyncState, auth_gate: AuthGate) -> Router {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/users/create", post(register))
        .route("/users/auth", get(authorize))
        .route("/syncs/progress", put(update_progress))
        .route("/syncs/progress/{document}", get(get_progress))
        .with_state(state)
        .layer(Extension(auth_gate))
        .layer(middleware::from_fn(require_accept_header))
}

/// GET /healthcheck
async fn healthcheck() -> impl IntoResponse {
    Json(json!({ "state": "OK" }))
}

/// POST /users/create - Register a new account
async fn register(
    State(state): State<SyncState>,
    body: Bytes,
) -> Result<impl IntoResponse, SyncError> {
    let request: RegisterRequest = decode_body(&body)?;
    let response = state.service.register(request)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /users/auth - Confirm stored credentials
async fn authorize(
    State(state): State<SyncState>,
    RequireAuth(user): RequireAuth,
) -> impl IntoResponse {
    Json(state.service.authorize(&user))
}

/// GET /syncs/progress/{document} - Latest position for a document
async fn get_progress(
    State(state): State<SyncState>,
    RequireAuth(user): RequireAuth,
    document: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, SyncError> {
    let Path(document) = document.map_err(|rejection| {
        warn!("Rejected document path: {}", rejection);
        SyncError::InternalError
    })?;
    Ok(Json(state.service.pull(&user, &document)?))
}

/// PUT /syncs/progress - Store the current position for a document
async fn update_progress(
    State(state): State<SyncState>,
    RequireAuth(user): RequireAuth,
    body: Bytes,
) -> Result<impl IntoResponse, SyncError> {
    let request: PushRequest = decode_body(&body)?;
    let response = state.service.push(&user, request)?;
    debug!(
        "Stored position {} for {} at {}",
        response.document, user.username, response.timestamp
    );
    Ok(Json(response))
}
