use anyhow::Result;
use rusqlite::Connection;

use crate::Database;

impl Database {
    // -- Key/value --

    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| query_value(conn, key))
    }

    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
                (key, value),
            )?;
            Ok(())
        })
    }

    /// Returns whether a row was removed.
    pub fn delete_value(&self, key: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
            Ok(n > 0)
        })
    }
}

fn query_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
    let value = stmt
        .query_row([key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
