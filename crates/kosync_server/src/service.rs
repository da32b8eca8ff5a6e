//! Register, authorize, pull and push, independent of the HTTP layer.

use crate::auth::AuthUser;
use crate::db::{CreateUserOutcome, PositionRecord, SyncRepo};
use crate::error::{SyncError, SyncResult};
use crate::protocol::{
    AuthorizedResponse, PositionResponse, PullResponse, PushRequest, PushResponse,
    RegisterRequest, RegisterResponse, valid_key_field,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Decode a JSON request body. Anything that is not the expected shape is
/// an `InvalidRequest`.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> SyncResult<T> {
    serde_json::from_slice(body).map_err(|err| {
        warn!("Rejected request body: {}", err);
        SyncError::InvalidRequest
    })
}

#[derive(Clone)]
pub struct SyncService {
    repo: Arc<SyncRepo>,
}

impl SyncService {
    pub fn new(repo: Arc<SyncRepo>) -> Self {
        Self { repo }
    }

    pub fn register(&self, request: RegisterRequest) -> SyncResult<RegisterResponse> {
        if request.username.is_empty() || request.password.is_empty() {
            return Err(SyncError::InvalidRequest);
        }

        match self.repo.create_user(&request.username, &request.password) {
            Ok(CreateUserOutcome::Created) => {
                info!("Registered user {}", request.username);
                Ok(RegisterResponse {
                    username: request.username,
                })
            }
            Ok(CreateUserOutcome::AlreadyExists) => Err(SyncError::AlreadyRegistered),
            Err(err) => {
                error!("Failed to register user {}: {}", request.username, err);
                Err(SyncError::InternalError)
            }
        }
    }

    pub fn authorize(&self, _user: &AuthUser) -> AuthorizedResponse {
        AuthorizedResponse { authorized: "OK" }
    }

    pub fn pull(&self, user: &AuthUser, document_id: &str) -> SyncResult<PullResponse> {
        match self.repo.get_position(&user.username, document_id) {
            Ok(Some(record)) => Ok(PullResponse::Found(PositionResponse {
                document: record.document_id,
                progress: record.progress,
                device: record.device,
                percentage: record.percentage,
                device_id: record.device_id,
                timestamp: record.timestamp,
            })),
            Ok(None) => Ok(PullResponse::Empty {}),
            Err(err) => {
                error!(
                    "Failed to read position {} for {}: {}",
                    document_id, user.username, err
                );
                Err(SyncError::InternalError)
            }
        }
    }

    /// Store a new position, stamped with the server clock.
    pub fn push(&self, user: &AuthUser, request: PushRequest) -> SyncResult<PushResponse> {
        let document_id = match request.document {
            Some(document_id) if valid_key_field(&document_id) => document_id,
            _ => return Err(SyncError::DocumentIdMissing),
        };
        let progress = request.progress.unwrap_or_default();
        let device = request.device.unwrap_or_default();
        if progress.is_empty() || device.is_empty() {
            return Err(SyncError::InvalidRequest);
        }

        let timestamp = chrono::Utc::now().timestamp();
        let record = PositionRecord {
            username: user.username.clone(),
            document_id,
            percentage: request.percentage.unwrap_or_default(),
            progress,
            device,
            device_id: request.device_id.unwrap_or_default(),
            timestamp,
        };

        if let Err(err) = self.repo.upsert_position(&record) {
            error!(
                "Failed to store position {} for {}: {}",
                record.document_id, record.username, err
            );
            return Err(SyncError::InternalError);
        }

        Ok(PushResponse {
            timestamp,
            document: record.document_id,
        })
    }
}
