use rusqlite::{Connection, OptionalExtension};

/// SQL schema for credentials and reading positions.
///
/// Column types match databases written by earlier kosync servers so an
/// existing `syncdata.db` can be opened in place.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS "user" (
    "username" TEXT(255),
    "password" TEXT(255)
);

CREATE TABLE IF NOT EXISTS "document" (
    "username" TEXT(255),
    "documentid" TEXT(255),
    "percentage" REAL(64,4),
    "progress" TEXT(255),
    "device" TEXT(255),
    "device_id" TEXT(255),
    "timestamp" INTEGER
);
"#;

/// Uniqueness constraints the stores rely on for atomic inserts and upserts.
const INDEXES: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS username ON user(username);
CREATE UNIQUE INDEX IF NOT EXISTS username_documentid ON document(username, documentid);
"#;

/// Initialize the database with the sync schema
pub fn init_database(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)?;

    // Forward migration: databases created without the unique indexes may
    // hold duplicate rows. Keep the first registration per username and the
    // most recent position per key so the indexes can be built.
    if !has_index(conn, "username")? {
        conn.execute(
            "DELETE FROM user WHERE rowid NOT IN (
                SELECT MIN(rowid) FROM user GROUP BY username
            )",
            [],
        )?;
    }

    if !has_index(conn, "username_documentid")? {
        conn.execute(
            "DELETE FROM document WHERE rowid NOT IN (
                SELECT rowid FROM (
                    SELECT rowid, ROW_NUMBER() OVER (
                        PARTITION BY username, documentid
                        ORDER BY timestamp DESC, rowid DESC
                    ) AS rn FROM document
                ) WHERE rn = 1
            )",
            [],
        )?;
    }

    conn.execute_batch(INDEXES)?;

    Ok(())
}

fn has_index(conn: &Connection, name: &str) -> Result<bool, rusqlite::Error> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='index' AND name=? LIMIT 1",
            [name],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='index' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_init_database() {
        let conn = Connection::open_in_memory().unwrap();
        init_database(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();
        assert!(tables.contains(&"user".to_string()));
        assert!(tables.contains(&"document".to_string()));

        let document_cols: Vec<String> = conn
            .prepare("PRAGMA table_info(document)")
            .unwrap()
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();
        assert_eq!(
            document_cols,
            vec![
                "username",
                "documentid",
                "percentage",
                "progress",
                "device",
                "device_id",
                "timestamp"
            ]
        );

        let indexes = index_names(&conn);
        assert!(indexes.contains(&"username".to_string()));
        assert!(indexes.contains(&"username_documentid".to_string()));
    }

    #[test]
    fn test_init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_database(&conn).unwrap();
        conn.execute(
            "INSERT INTO user (username, password) VALUES ('alice', 's3cret')",
            [],
        )
        .unwrap();

        init_database(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_migrates_duplicate_positions() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO document VALUES ('alice', 'bookA', 0.1, '10', 'phone', 'p1', 100);
            INSERT INTO document VALUES ('alice', 'bookA', 0.5, '50', 'kobo', 'k1', 300);
            INSERT INTO document VALUES ('alice', 'bookA', 0.3, '30', 'phone', 'p1', 200);
            INSERT INTO document VALUES ('bob', 'bookA', 0.2, '20', 'kindle', 'k2', 50);
            "#,
        )
        .unwrap();

        init_database(&conn).unwrap();

        let (progress, timestamp): (String, i64) = conn
            .query_row(
                "SELECT progress, timestamp FROM document WHERE username = 'alice' AND documentid = 'bookA'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(progress, "50");
        assert_eq!(timestamp, 300);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM document", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
        assert!(index_names(&conn).contains(&"username_documentid".to_string()));
    }

    #[test]
    fn test_migrates_duplicate_users() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO user VALUES ('alice', 'first');
            INSERT INTO user VALUES ('bob', 'hunter2');
            INSERT INTO user VALUES ('alice', 'second');
            "#,
        )
        .unwrap();

        init_database(&conn).unwrap();

        let password: String = conn
            .query_row(
                "SELECT password FROM user WHERE username = 'alice'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(password, "first");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
        assert!(index_names(&conn).contains(&"username".to_string()));
        assert!(has_index(&conn, "username").unwrap());
        assert!(!has_index(&conn, "no_such_index").unwrap());
    }
}
