use rusqlite::Connection;

use super::StorageError;

// `current_requests` is informational only; live counts are owned by the counter store.
pub const RATE_LIMITS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS rate_limits (
    id TEXT PRIMARY KEY,
    "limit" INTEGER NOT NULL CHECK ("limit" > 0),
    current_requests INTEGER NOT NULL DEFAULT 0,
    reset_after INTEGER NOT NULL CHECK (reset_after > 0),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

pub fn init_database(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(RATE_LIMITS_TABLE_SCHEMA)?;
    Ok(())
}
