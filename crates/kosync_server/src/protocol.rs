//! Wire types for the KOReader sync protocol.

use serde::{Deserialize, Deserializer, Serialize};

/// The only Accept value clients may send.
pub const ACCEPT_MEDIA_TYPE: &str = "application/vnd.koreader.v1+json";

/// Header carrying the claimed username.
pub const AUTH_USER_HEADER: &str = "x-auth-user";

/// Header carrying the presented key.
pub const AUTH_KEY_HEADER: &str = "x-auth-key";

/// Reserved delimiter that may not appear in usernames or document ids.
pub const KEY_DELIMITER: char = ':';

/// True if `field` can be used as part of a composite key.
pub fn valid_key_field(field: &str) -> bool {
    !field.is_empty() && !field.contains(KEY_DELIMITER)
}

/// Reading progress as sent by a client.
///
/// Paged documents report a page number, reflowable ones an opaque locator
/// string. Both are stored as text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Progress {
    Integer(i64),
    Text(String),
}

impl Progress {
    pub fn into_text(self) -> String {
        match self {
            Progress::Integer(page) => page.to_string(),
            Progress::Text(text) => text,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct AuthorizedResponse {
    pub authorized: &'static str,
}

/// Body of a position push.
///
/// `progress` is already normalized to text by the time it leaves the
/// deserializer. `timestamp` is accepted but the server stamps its own.
#[derive(Debug, Clone, Deserialize)]
pub struct PushRequest {
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default, deserialize_with = "progress_as_text")]
    pub progress: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

fn progress_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Progress>::deserialize(deserializer)?.map(Progress::into_text))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushResponse {
    pub timestamp: i64,
    pub document: String,
}

/// Stored position as returned by a pull.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionResponse {
    pub document: String,
    pub progress: String,
    pub device: String,
    pub percentage: f64,
    pub device_id: String,
    pub timestamp: i64,
}

/// Result of a pull: a stored position, or nothing yet.
///
/// `Empty` serializes as `{}` so clients see an empty object rather than
/// an error for documents that were never synced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PullResponse {
    Found(PositionResponse),
    Empty {},
}
