//! # Pool & Database Handle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig::new("cafe.db")          DbConfig::in_memory()               │
//! │        │  5 connections, WAL            │  1 connection (tests)        │
//! │        └──────────────┬─────────────────┘                              │
//! │                       ▼                                                 │
//! │          Database::new ──► connect ──► migrate                         │
//! │                       │                                                 │
//! │        ┌──────────────┼──────────────┬──────────────┬─────────────┐    │
//! │        ▼              ▼              ▼              ▼             ▼    │
//! │     orders()       users()      sessions()       menu()    newsletter()│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Readers run in parallel under WAL; writers queue on SQLite's lock for up
//! to `busy_timeout` before failing with [`DbError::Busy`].

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::menu::MenuRepository;
use crate::repository::newsletter::NewsletterRepository;
use crate::repository::order::OrderRepository;
use crate::repository::session::SessionRepository;
use crate::repository::user::UserRepository;

const MEMORY: &str = ":memory:";

/// Where the store lives and how hard it may be pushed.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
    /// How long a writer waits for another writer to finish.
    pub busy_timeout: Duration,
    pub acquire_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    /// A file-backed store; the file is created on first connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(30),
            run_migrations: true,
        }
    }

    /// A private in-memory store. It only exists while its single
    /// connection is open, so every query goes through that connection.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            ..DbConfig::new(MEMORY)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn is_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let url = format!("sqlite://{}?mode=rwc", self.database_path.display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout)
            .create_if_missing(true);

        // WAL needs a file to put its log next to.
        Ok(if self.is_memory() {
            options
        } else {
            options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        })
    }
}

/// Shared store handle. Clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(config.acquire_timeout);
        if config.is_memory() {
            // Dropping the last connection would drop the data with it.
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Database opened"
        );

        let db = Database { pool };
        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
        }
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Issued bearer tokens.
    pub fn sessions(&self) -> SessionRepository {
        SessionRepository::new(self.pool.clone())
    }

    /// Menu items and locations.
    pub fn menu(&self) -> MenuRepository {
        MenuRepository::new(self.pool.clone())
    }

    pub fn newsletter(&self) -> NewsletterRepository {
        NewsletterRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// Used by `/health`.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
        assert!(total >= 1);

        db.close().await;
        assert!(!db.health_check().await);
    }

    #[test]
    fn test_config() {
        let file = DbConfig::new("/tmp/cafe.db")
            .max_connections(8)
            .busy_timeout(Duration::from_secs(1))
            .run_migrations(false);
        assert_eq!(file.max_connections, 8);
        assert_eq!(file.busy_timeout, Duration::from_secs(1));
        assert!(!file.run_migrations);
        assert!(!file.is_memory());

        let memory = DbConfig::in_memory();
        assert!(memory.is_memory());
        assert_eq!(memory.max_connections, 1);
        assert!(memory.run_migrations);
    }
}
