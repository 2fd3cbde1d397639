//! SQLite-based storage implementation

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sahayata_core::Row;
use serde_json::Value;
use uuid::Uuid;

use super::{
    apply_patch, matches_filter, prepare_insert, Collection, RowStore, Session, SessionId,
    SessionStore, StoreResult, User, UserStore,
};
use crate::crypto::generate_session_token;
use crate::error::ServerError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQLite-based store implementing UserStore, SessionStore and RowStore
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, ServerError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ServerError::Internal(format!("Lock poisoned: {}", e)))
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), ServerError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, ServerError> {
        let table_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        Ok(conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })?)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), ServerError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL
            );

            -- One JSON document per row, addressed by collection and id
            CREATE TABLE IF NOT EXISTS rows (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                UNIQUE (collection, id)
            );
            CREATE INDEX IF NOT EXISTS idx_rows_collection ON rows(collection);
            "#,
        )?;

        Ok(())
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_uuid(s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn decode_row(data: &str) -> StoreResult<Row> {
    match serde_json::from_str(data)? {
        Value::Object(row) => Ok(row),
        _ => Err(ServerError::Internal("Stored row is not an object".to_string())),
    }
}

impl UserStore for SqliteStore {
    fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let conn = self.lock()?;
        let user = User {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO users (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.created_at.to_rfc3339()
            ],
        )?;
        if inserted == 0 {
            return Err(ServerError::EmailAlreadyExists);
        }
        Ok(user)
    }

    fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        let conn = self.lock()?;

        Ok(conn
            .query_row(
                "SELECT id, email, password_hash, created_at FROM users WHERE id = ?1",
                params![user_id.to_string()],
                |row| {
                    let id: String = row.get(0)?;
                    let created_at: String = row.get(3)?;
                    Ok(User {
                        id: parse_uuid(&id)?,
                        email: row.get(1)?,
                        password_hash: row.get(2)?,
                        created_at: parse_timestamp(&created_at),
                    })
                },
            )
            .optional()?)
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let normalized = email.trim().to_lowercase();
        let conn = self.lock()?;

        let user_id: Option<String> = conn
            .query_row(
                "SELECT id FROM users WHERE email = ?1",
                params![normalized],
                |row| row.get(0),
            )
            .optional()?;

        drop(conn); // Release lock before calling get_user

        match user_id {
            Some(id) => self.get_user(parse_uuid(&id)?),
            None => Ok(None),
        }
    }
}

impl SessionStore for SqliteStore {
    fn create(&self, user: &User) -> StoreResult<Session> {
        let conn = self.lock()?;
        let session = Session {
            id: SessionId(generate_session_token()),
            user_id: user.id,
            email: user.email.clone(),
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO sessions (id, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![
                session.id.0,
                session.user_id.to_string(),
                session.created_at.to_rfc3339()
            ],
        )?;

        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        let conn = self.lock()?;

        Ok(conn
            .query_row(
                "SELECT s.id, s.user_id, u.email, s.created_at
                 FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.id = ?1",
                params![session_id.0],
                |row| {
                    let user_id: String = row.get(1)?;
                    let created_at: String = row.get(3)?;
                    Ok(Session {
                        id: SessionId(row.get(0)?),
                        user_id: parse_uuid(&user_id)?,
                        email: row.get(2)?,
                        created_at: parse_timestamp(&created_at),
                    })
                },
            )
            .optional()?)
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id.0])?;
        Ok(())
    }
}

impl RowStore for SqliteStore {
    fn insert(&self, collection: Collection, mut row: Row) -> StoreResult<Row> {
        let id = prepare_insert(&mut row)?;
        let data = serde_json::to_string(&row)?;
        let conn = self.lock()?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO rows (collection, id, data) VALUES (?1, ?2, ?3)",
            params![collection.as_str(), id, data],
        )?;
        if inserted == 0 {
            return Err(ServerError::DuplicateRow(id));
        }
        Ok(row)
    }

    fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Row>> {
        let conn = self.lock()?;
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM rows WHERE collection = ?1 AND id = ?2",
                params![collection.as_str(), id],
                |row| row.get(0),
            )
            .optional()?;
        data.as_deref().map(decode_row).transpose()
    }

    fn select(&self, collection: Collection, filter: Option<(&str, &str)>) -> StoreResult<Vec<Row>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT data FROM rows WHERE collection = ?1 ORDER BY seq")?;
        let data = stmt
            .query_map(params![collection.as_str()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::with_capacity(data.len());
        for data in data {
            let row = decode_row(&data)?;
            if matches_filter(&row, filter) {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn update(&self, collection: Collection, id: &str, patch: Row) -> StoreResult<Option<Row>> {
        let conn = self.lock()?;
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM rows WHERE collection = ?1 AND id = ?2",
                params![collection.as_str(), id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(data) = data else {
            return Ok(None);
        };

        let mut row = decode_row(&data)?;
        apply_patch(&mut row, patch);
        conn.execute(
            "UPDATE rows SET data = ?1 WHERE collection = ?2 AND id = ?3",
            params![serde_json::to_string(&row)?, collection.as_str(), id],
        )?;
        Ok(Some(row))
    }

    fn count(&self, collection: Collection) -> StoreResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM rows WHERE collection = ?1",
            params![collection.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
