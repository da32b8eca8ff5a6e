use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use std::sync::{Arc, Mutex, MutexGuard};

/// Stored credential row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub username: String,
    pub password: String,
}

/// Outcome of inserting a credential row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateUserOutcome {
    Created,
    AlreadyExists,
}

/// Current reading position for one (username, documentid) key.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRecord {
    pub username: String,
    pub document_id: String,
    pub percentage: f64,
    pub progress: String,
    pub device: String,
    pub device_id: String,
    pub timestamp: i64,
}

/// Credential and position storage backed by a single SQLite connection.
///
/// Every operation is one SQL statement executed under the connection lock,
/// so duplicate detection and upserts never race with other requests.
#[derive(Clone)]
pub struct SyncRepo {
    conn: Arc<Mutex<Connection>>,
}

impl SyncRepo {
    /// Create a new SyncRepo with the given connection
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ===== User operations =====

    /// Insert a credential row. A duplicate username is reported by the
    /// unique index at insert time.
    pub fn create_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<CreateUserOutcome, rusqlite::Error> {
        let conn = self.conn();
        match conn.execute(
            "INSERT INTO user (username, password) VALUES (?, ?)",
            params![username, password],
        ) {
            Ok(_) => Ok(CreateUserOutcome::Created),
            Err(err) if is_constraint_violation(&err) => Ok(CreateUserOutcome::AlreadyExists),
            Err(err) => Err(err),
        }
    }

    /// Get a user by username (case-sensitive exact match)
    pub fn get_user(&self, username: &str) -> Result<Option<UserInfo>, rusqlite::Error> {
        let conn = self.conn();
        conn.query_row(
            "SELECT username, password FROM user WHERE username = ?",
            [username],
            |row| {
                Ok(UserInfo {
                    username: row.get(0)?,
                    password: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                })
            },
        )
        .optional()
    }

    // ===== Document operations =====

    /// Get the stored position for a document, if any
    pub fn get_position(
        &self,
        username: &str,
        document_id: &str,
    ) -> Result<Option<PositionRecord>, rusqlite::Error> {
        let conn = self.conn();
        conn.query_row(
            "SELECT username, documentid, percentage, progress, device, device_id, timestamp
             FROM document WHERE username = ? AND documentid = ?",
            params![username, document_id],
            |row| {
                Ok(PositionRecord {
                    username: row.get(0)?,
                    document_id: row.get(1)?,
                    percentage: row.get::<_, Option<f64>>(2)?.unwrap_or_default(),
                    progress: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    device: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    device_id: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    timestamp: row.get::<_, Option<i64>>(6)?.unwrap_or_default(),
                })
            },
        )
        .optional()
    }

    /// Insert or replace the position for `(record.username, record.document_id)`.
    pub fn upsert_position(&self, record: &PositionRecord) -> Result<(), rusqlite::Error> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO document (username, documentid, percentage, progress, device, device_id, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(username, documentid)
             DO UPDATE SET percentage = ?3, progress = ?4, device = ?5, device_id = ?6, timestamp = ?7",
            params![
                record.username,
                record.document_id,
                record.percentage,
                record.progress,
                record.device,
                record.device_id,
                record.timestamp,
            ],
        )?;
        Ok(())
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}
