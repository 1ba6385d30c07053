use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::quota::QuotaConfig;

use super::error::StorageError;
use super::schema::init_database;
use super::{ConfigStore, RATE_LIMITS_DB_FILENAME};

/// Durable quota store backed by a single SQLite file.
pub struct SqliteConfigStore {
    conn: Mutex<Connection>,
}

impl SqliteConfigStore {
    pub fn open(data_dir: &Path, busy_timeout: Duration) -> Result<Self, StorageError> {
        std::fs::create_dir_all(data_dir)?;
        let conn = Connection::open(data_dir.join(RATE_LIMITS_DB_FILENAME))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn, busy_timeout)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?, Duration::from_secs(1))
    }

    fn from_connection(conn: Connection, busy_timeout: Duration) -> Result<Self, StorageError> {
        conn.busy_timeout(busy_timeout)?;
        init_database(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Last usage snapshot written by [`ConfigStore::record_usage`].
    pub fn current_requests(&self, id: &str) -> Result<Option<u64>, StorageError> {
        let conn = self.connection()?;
        let used = conn
            .query_row(
                "SELECT current_requests FROM rate_limits WHERE id = ?1",
                params![id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        used.map(|value| from_column(id, "current_requests", value))
            .transpose()
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::ConnectionPoisoned)
    }
}

impl ConfigStore for SqliteConfigStore {
    fn save(&self, config: &QuotaConfig) -> Result<(), StorageError> {
        let limit = to_column(&config.id, "limit", config.limit)?;
        let reset_after = to_column(&config.id, "reset_after", config.reset_after)?;
        let conn = self.connection()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO rate_limits (id, "limit", current_requests, reset_after, created_at, updated_at)
            VALUES (?1, ?2, 0, ?3, ?4, ?4)
            ON CONFLICT(id) DO UPDATE SET
                "limit" = excluded."limit",
                reset_after = excluded.reset_after,
                updated_at = excluded.updated_at
            "#,
            params![config.id, limit, reset_after, now],
        )?;

        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<QuotaConfig>, StorageError> {
        let conn = self.connection()?;
        let row = conn
            .query_row(
                r#"SELECT id, "limit", reset_after FROM rate_limits WHERE id = ?1"#,
                params![id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?)),
            )
            .optional()?;

        row.map(row_to_config).transpose()
    }

    fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let conn = self.connection()?;
        let removed = conn.execute("DELETE FROM rate_limits WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn load_all(&self) -> Result<Vec<QuotaConfig>, StorageError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(r#"SELECT id, "limit", reset_after FROM rate_limits ORDER BY id"#)?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
        })?;

        let mut configs = Vec::new();
        for row in rows {
            configs.push(row_to_config(row?)?);
        }
        Ok(configs)
    }

    fn record_usage(&self, id: &str, current_requests: u64) -> Result<(), StorageError> {
        let used = to_column(id, "current_requests", current_requests)?;
        let conn = self.connection()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "UPDATE rate_limits SET current_requests = ?1, updated_at = ?2 WHERE id = ?3",
            params![used, now, id],
        )?;

        Ok(())
    }
}

fn to_column(id: &str, field: &str, value: u64) -> Result<i64, StorageError> {
    i64::try_from(value).map_err(|_| StorageError::InvalidRecord {
        id: id.to_string(),
        reason: format!("{field} {value} does not fit in an INTEGER column"),
    })
}

fn from_column(id: &str, field: &str, value: i64) -> Result<u64, StorageError> {
    u64::try_from(value).map_err(|_| StorageError::InvalidRecord {
        id: id.to_string(),
        reason: format!("negative {field} {value}"),
    })
}

fn row_to_config((id, limit, reset_after): (String, i64, i64)) -> Result<QuotaConfig, StorageError> {
    let limit = from_column(&id, "limit", limit)?;
    let reset_after = from_column(&id, "reset_after", reset_after)?;
    if limit == 0 || reset_after == 0 {
        return Err(StorageError::InvalidRecord {
            id,
            reason: format!("zero limit={limit} or reset_after={reset_after}"),
        });
    }

    Ok(QuotaConfig {
        id,
        limit,
        reset_after,
    })
}
