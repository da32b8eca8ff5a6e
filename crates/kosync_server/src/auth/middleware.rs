use super::gate::{AuthGate, AuthUser, Credentials, header_str};
use crate::error::SyncError;
use crate::protocol::ACCEPT_MEDIA_TYPE;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

/// Rejects requests whose headers cannot be read or whose Accept header is
/// not the sync protocol media type.
pub async fn require_accept_header(request: Request, next: Next) -> Response {
    let headers = request.headers();
    let accept = match header_str(headers, header::ACCEPT.as_str()) {
        Ok(accept) => accept,
        Err(err) => return err.into_response(),
    };
    if let Err(err) = Credentials::from_headers(headers) {
        return err.into_response();
    }

    if accept != ACCEPT_MEDIA_TYPE {
        debug!("Rejected Accept header {:?}", accept);
        return SyncError::InvalidAcceptFormat.into_response();
    }

    next.run(request).await
}

/// Extractor that requires valid `x-auth-user` / `x-auth-key` headers.
///
/// Needs an `Extension<AuthGate>` layer on the router.
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = SyncError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(gate) = parts.extensions.get::<AuthGate>() else {
            error!("AuthGate extension missing from router");
            return Err(SyncError::InternalError);
        };
        let credentials = Credentials::from_headers(&parts.headers)?;
        gate.authenticate(&credentials).map(RequireAuth)
    }
}
