//! Error kinds returned to sync clients.
//!
//! Every failure the protocol reports maps to exactly one variant here, each
//! with a fixed numeric code, HTTP status and message. Clients match on the
//! `code` field of the JSON body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Result type for protocol operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("Invalid Header")]
    InvalidHeader,

    #[error("Invalid Accept header format.")]
    InvalidAcceptFormat,

    #[error("Invalid Request")]
    InvalidRequest,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Username is already registered.")]
    AlreadyRegistered,

    #[error("Field 'document' not provided.")]
    DocumentIdMissing,

    #[error("Unknown server error.")]
    InternalError,
}

impl SyncError {
    /// Numeric error code sent to clients.
    pub fn code(&self) -> u16 {
        match self {
            SyncError::InvalidHeader => 100,
            SyncError::InvalidAcceptFormat => 101,
            SyncError::InternalError => 500,
            SyncError::Unauthorized => 2001,
            SyncError::AlreadyRegistered => 2002,
            SyncError::InvalidRequest => 2003,
            SyncError::DocumentIdMissing => 2004,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SyncError::InvalidHeader => StatusCode::BAD_REQUEST,
            SyncError::InvalidAcceptFormat => StatusCode::PRECONDITION_FAILED,
            SyncError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            SyncError::Unauthorized => StatusCode::UNAUTHORIZED,
            SyncError::AlreadyRegistered
            | SyncError::InvalidRequest
            | SyncError::DocumentIdMissing => StatusCode::FORBIDDEN,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: u16,
    message: String,
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                code: self.code(),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let cases = [
            (SyncError::InvalidHeader, 100, StatusCode::BAD_REQUEST),
            (
                SyncError::InvalidAcceptFormat,
                101,
                StatusCode::PRECONDITION_FAILED,
            ),
            (
                SyncError::InternalError,
                500,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (SyncError::Unauthorized, 2001, StatusCode::UNAUTHORIZED),
            (SyncError::AlreadyRegistered, 2002, StatusCode::FORBIDDEN),
            (SyncError::InvalidRequest, 2003, StatusCode::FORBIDDEN),
            (SyncError::DocumentIdMissing, 2004, StatusCode::FORBIDDEN),
        ];
        for (err, code, status) in cases {
            assert_eq!(err.code(), code, "{err:?}");
            assert_eq!(err.status(), status, "{err:?}");
        }
    }

    #[tokio::test]
    async fn test_error_body() {
        let response = SyncError::DocumentIdMissing.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], 2004);
        assert_eq!(json["message"], "Field 'document' not provided.");
    }
}
