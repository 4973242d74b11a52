//! Target store: the normalized project / base plan / version / key dates schema.
//!
//! Accessors in the submodules are free functions over a `&Connection` so the
//! reconciliation engine can pass its open `Transaction` straight through.
//! Writes made on a transaction are visible to later reads on the same
//! transaction and become durable only when the caller commits.

pub mod base_plans;
pub mod key_dates;
pub mod projects;
pub mod reports;
pub mod schema;
pub mod versions;

use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping the target SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Run database migrations.
    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        embedded::migrations::runner().run(&mut *conn)?;
        Ok(())
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, E>,
    {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Connection) -> std::result::Result<T, E>,
    {
        let mut conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut conn)
    }

    /// Row counts of the migrated tables, keyed by table name.
    pub fn table_counts(&self) -> rusqlite::Result<TableCounts> {
        self.with_conn(|conn| {
            let count = |table: &str| -> rusqlite::Result<i64> {
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })
            };
            Ok(TableCounts {
                projects: count("project")?,
                base_plans: count("base_plan")?,
                versions: count("version")?,
                key_dates: count("key_dates")?,
            })
        })
    }
}

/// Number of rows in each target table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TableCounts {
    pub projects: i64,
    pub base_plans: i64,
    pub versions: i64,
    pub key_dates: i64,
}

/// Current wall-clock time as stored in timestamp columns.
pub fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// Read a UUID stored as text.
pub(crate) fn uuid_column(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(raw.trim())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a UUID stored as text, by column name.
pub(crate) fn uuid_named(row: &Row, name: &str) -> rusqlite::Result<Uuid> {
    let idx = row.as_ref().column_index(name)?;
    uuid_column(row, idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_create_empty_tables() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.table_counts().unwrap(), TableCounts::default());
    }

    #[test]
    fn file_database_reopens_without_rerunning_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.db");
        {
            let db = Database::open(&path).unwrap();
            db.with_conn(|conn| {
                conn.execute(
                    "INSERT INTO project (name, uuid) VALUES ('p', '00000000-0000-0000-0000-000000000001')",
                    [],
                )
            })
            .unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.table_counts().unwrap().projects, 1);
    }
}
