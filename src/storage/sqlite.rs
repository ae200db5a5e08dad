//! SQLite-backed journal. Each write opens its own connection, makes sure the
//! target table exists, inserts one row and closes again.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::{params, Connection};

use super::journal::Journal;
use crate::error::{Error, Result};

const MESSAGES_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        chat_id INTEGER,
        user_id INTEGER,
        message_text TEXT,
        timestamp TEXT,
        is_response BOOLEAN DEFAULT FALSE
    );
"#;

const LOCATIONS_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS locations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        chat_id INTEGER,
        user_id INTEGER,
        latitude REAL,
        longitude REAL,
        timestamp TEXT
    );
"#;

/// Row totals, as reported by `relaybot stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalCounts {
    pub messages: u64,
    pub responses: u64,
    pub locations: u64,
}

#[derive(Debug, Clone)]
pub struct SqliteJournal {
    path: PathBuf,
}

impl SqliteJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self, schema: &str) -> Result<Connection> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.path)
            .map_err(|e| Error::Storage(format!("sqlite open: {}", e)))?;
        conn.execute_batch(schema)
            .map_err(|e| Error::Storage(format!("sqlite init: {}", e)))?;
        Ok(conn)
    }

    fn close(conn: Connection) -> Result<()> {
        conn.close()
            .map_err(|(_, e)| Error::Storage(format!("sqlite close: {}", e)))
    }

    /// Blocking insert into `messages`.
    pub fn insert_message(
        &self,
        chat_id: i64,
        user_id: i64,
        text: &str,
        timestamp: &str,
        is_response: bool,
    ) -> Result<i64> {
        let conn = self.connect(MESSAGES_SCHEMA)?;
        conn.execute(
            "INSERT INTO messages (chat_id, user_id, message_text, timestamp, is_response) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![chat_id, user_id, text, timestamp, is_response],
        )
        .map_err(|e| Error::Storage(format!("sqlite insert message: {}", e)))?;
        let id = conn.last_insert_rowid();
        Self::close(conn)?;
        Ok(id)
    }

    /// Blocking insert into `locations`.
    pub fn insert_location(
        &self,
        chat_id: i64,
        user_id: i64,
        latitude: f64,
        longitude: f64,
        timestamp: &str,
    ) -> Result<i64> {
        let conn = self.connect(LOCATIONS_SCHEMA)?;
        conn.execute(
            "INSERT INTO locations (chat_id, user_id, latitude, longitude, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![chat_id, user_id, latitude, longitude, timestamp],
        )
        .map_err(|e| Error::Storage(format!("sqlite insert location: {}", e)))?;
        let id = conn.last_insert_rowid();
        Self::close(conn)?;
        Ok(id)
    }

    /// Count rows per kind. Tables that were never written count as empty.
    pub fn counts(&self) -> Result<JournalCounts> {
        if !self.path.exists() {
            return Ok(JournalCounts::default());
        }
        let conn = Connection::open(&self.path)
            .map_err(|e| Error::Storage(format!("sqlite open: {}", e)))?;

        let has_table = |name: &str| -> Result<bool> {
            let n: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .map_err(|e| Error::Storage(format!("sqlite schema lookup: {}", e)))?;
            Ok(n > 0)
        };

        let mut counts = JournalCounts::default();
        if has_table("messages")? {
            let (messages, responses): (i64, i64) = conn
                .query_row(
                    "SELECT COALESCE(SUM(is_response = 0), 0), COALESCE(SUM(is_response = 1), 0) FROM messages",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .map_err(|e| Error::Storage(format!("sqlite count messages: {}", e)))?;
            counts.messages = messages as u64;
            counts.responses = responses as u64;
        }
        if has_table("locations")? {
            let locations: i64 = conn
                .query_row("SELECT COUNT(*) FROM locations", [], |row| row.get(0))
                .map_err(|e| Error::Storage(format!("sqlite count locations: {}", e)))?;
            counts.locations = locations as u64;
        }
        Ok(counts)
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Storage(format!("storage task failed: {}", e)))?
}

#[async_trait]
impl Journal for SqliteJournal {
    async fn record_message(
        &self,
        chat_id: i64,
        user_id: i64,
        text: &str,
        timestamp: &str,
        is_response: bool,
    ) -> Result<i64> {
        let journal = self.clone();
        let text = text.to_string();
        let timestamp = timestamp.to_string();
        blocking(move || journal.insert_message(chat_id, user_id, &text, &timestamp, is_response))
            .await
    }

    async fn record_location(
        &self,
        chat_id: i64,
        user_id: i64,
        latitude: f64,
        longitude: f64,
        timestamp: &str,
    ) -> Result<i64> {
        let journal = self.clone();
        let timestamp = timestamp.to_string();
        blocking(move || journal.insert_location(chat_id, user_id, latitude, longitude, &timestamp))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_journal() -> (SqliteJournal, TempDir) {
        let dir = TempDir::new().unwrap();
        let journal = SqliteJournal::new(dir.path().join("bot_database.db"));
        (journal, dir)
    }

    fn table_exists(path: &Path, name: &str) -> bool {
        let conn = Connection::open(path).unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            > 0
    }

    #[test]
    fn test_tables_created_lazily() {
        let (journal, _dir) = create_test_journal();

        journal.insert_message(1, 2, "hi", "2024-01-01T00:00:00+00:00", false).unwrap();
        assert!(table_exists(journal.path(), "messages"));
        assert!(!table_exists(journal.path(), "locations"));

        journal.insert_location(1, 2, 1.5, 2.5, "2024-01-01T00:00:00+00:00").unwrap();
        assert!(table_exists(journal.path(), "locations"));
    }

    #[test]
    fn test_message_row_contents() {
        let (journal, _dir) = create_test_journal();
        let id = journal
            .insert_message(-100, 42, "Echo: hi", "2024-01-01T00:00:01+00:00", true)
            .unwrap();

        let conn = Connection::open(journal.path()).unwrap();
        let (chat_id, user_id, text, ts, is_response): (i64, i64, String, String, bool) = conn
            .query_row(
                "SELECT chat_id, user_id, message_text, timestamp, is_response FROM messages WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .unwrap();
        assert_eq!(chat_id, -100);
        assert_eq!(user_id, 42);
        assert_eq!(text, "Echo: hi");
        assert_eq!(ts, "2024-01-01T00:00:01+00:00");
        assert!(is_response);
    }

    #[test]
    fn test_ids_strictly_increase() {
        let (journal, _dir) = create_test_journal();
        let mut last = 0;
        for i in 0..5 {
            let id = journal.insert_message(1, 1, &format!("m{}", i), "t", i % 2 == 0).unwrap();
            assert!(id > last);
            last = id;
        }

        let first = journal.insert_location(1, 1, 0.0, 0.0, "t").unwrap();
        let second = journal.insert_location(1, 1, 0.0, 0.0, "t").unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_counts() {
        let (journal, _dir) = create_test_journal();
        assert_eq!(journal.counts().unwrap(), JournalCounts::default());

        journal.insert_message(1, 1, "a", "t", false).unwrap();
        journal.insert_message(1, 1, "b", "t", true).unwrap();
        journal.insert_message(1, 1, "c", "t", true).unwrap();

        let counts = journal.counts().unwrap();
        assert_eq!(counts.messages, 1);
        assert_eq!(counts.responses, 2);
        assert_eq!(counts.locations, 0);
    }

    #[test]
    fn test_unwritable_path_is_storage_error() {
        let dir = TempDir::new().unwrap();
        // A directory where the database file should be.
        let journal = SqliteJournal::new(dir.path());
        assert!(matches!(
            journal.insert_message(1, 1, "x", "t", false),
            Err(Error::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_async_journal() {
        let (journal, _dir) = create_test_journal();
        let inbound = journal.record_message(5, 6, "hello", "t0", false).await.unwrap();
        let response = journal.record_response(5, 6, "Echo: hello", "t1").await.unwrap();
        assert!(response > inbound);

        let loc = journal.record_location(5, 6, 51.5, -0.12, "t2").await.unwrap();
        assert_eq!(loc, 1);

        let conn = Connection::open(journal.path()).unwrap();
        let (lat, lon): (f64, f64) = conn
            .query_row("SELECT latitude, longitude FROM locations WHERE id = ?1", params![loc], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(lat, 51.5);
        assert_eq!(lon, -0.12);
    }
}
