use crate::db::SyncRepo;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{AUTH_KEY_HEADER, AUTH_USER_HEADER, valid_key_field};
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Identity claimed by a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub key: String,
}

impl Credentials {
    /// Read the identity headers. Absent headers yield empty fields; values
    /// that are not valid UTF-8 are rejected as `InvalidHeader`.
    pub fn from_headers(headers: &HeaderMap) -> SyncResult<Self> {
        Ok(Self {
            username: header_str(headers, AUTH_USER_HEADER)?.to_string(),
            key: header_str(headers, AUTH_KEY_HEADER)?.to_string(),
        })
    }
}

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> SyncResult<&'a str> {
    match headers.get(name) {
        Some(value) => {
            std::str::from_utf8(value.as_bytes()).map_err(|_| SyncError::InvalidHeader)
        }
        None => Ok(""),
    }
}

/// Authenticated user identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
}

/// Checks presented credentials against the credential store.
///
/// Every failure yields the same `Unauthorized` kind so a caller cannot
/// tell an unknown user from a wrong key.
#[derive(Clone)]
pub struct AuthGate {
    repo: Arc<SyncRepo>,
}

impl AuthGate {
    pub fn new(repo: Arc<SyncRepo>) -> Self {
        Self { repo }
    }

    pub fn authenticate(&self, credentials: &Credentials) -> SyncResult<AuthUser> {
        if !valid_key_field(&credentials.username) || credentials.key.is_empty() {
            return Err(SyncError::Unauthorized);
        }

        let user = match self.repo.get_user(&credentials.username) {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!("Rejected credentials for unknown user");
                return Err(SyncError::Unauthorized);
            }
            Err(err) => {
                error!("Failed to look up user {}: {}", credentials.username, err);
                return Err(SyncError::InternalError);
            }
        };

        if user.password != credentials.key {
            debug!("Rejected credentials for {}", credentials.username);
            return Err(SyncError::Unauthorized);
        }

        Ok(AuthUser {
            username: user.username,
        })
    }
}
