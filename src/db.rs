use crate::error::{BudgetError, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

const MIGRATIONS: &[(&str, &str)] = &[(
    "001_create_budget_tables",
    include_str!("../migrations/001_create_budget_tables.sql"),
)];

/// Owns the SQLite connection backing [`crate::storage::DatabaseStorage`].
pub struct DatabaseManager {
    conn: Mutex<Connection>,
}

impl DatabaseManager {
    /// Open (or create) the database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        info!("Opening SQLite database at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    /// Private in-memory database, used by tests and `--in-memory` runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get exclusive access to the connection
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| BudgetError::Storage {
            message: "database connection lock poisoned".to_string(),
        })
    }

    /// Run database migrations that have not been applied yet
    pub fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");
        let conn = self.connection()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                name       TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )?;

        for (name, sql) in MIGRATIONS {
            let applied: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE name = ?1)",
                [name],
                |row| row.get(0),
            )?;
            if applied {
                continue;
            }
            conn.execute_batch(sql)?;
            conn.execute("INSERT INTO schema_migrations (name) VALUES (?1)", [name])?;
            info!("Applied migration {}", name);
        }

        info!("Database migrations completed successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let db = DatabaseManager::open_in_memory().unwrap();
        db.run_migrations().unwrap();
        db.run_migrations().unwrap();

        let conn = db.connection().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("budget.db");
        let db = DatabaseManager::open(&path).unwrap();
        db.run_migrations().unwrap();
        assert!(path.exists());
    }
}
