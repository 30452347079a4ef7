//! Database connection and configuration

use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use pullreq_core::config::DatabaseSettings;
use pullreq_core::{StoreError, StoreHealth, StoreResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use tracing::{debug, info};

use crate::error::Result;
use crate::repos::{PullRequestRepository, TeamRepository, UserRepository};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseSettings::default().into()
    }
}

impl From<DatabaseSettings> for DatabaseConfig {
    fn from(settings: DatabaseSettings) -> Self {
        Self {
            path: settings.path,
            max_connections: settings.max_connections,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database config with the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: 5,
        }
    }

    /// Set the maximum number of connections
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database with the given configuration
    pub async fn connect(config: DatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options =
            SqliteConnectOptions::from_str(&format!("sqlite://{}", config.path.display()))?
                .create_if_missing(true)
                .foreign_keys(true)
                .journal_mode(SqliteJournalMode::Wal)
                .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        info!(
            path = %config.path.display(),
            max_connections = config.max_connections,
            "Connected to database"
        );
        Ok(Self { pool })
    }

    /// Apply pending migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        debug!("Database migrations applied");
        Ok(())
    }

    /// Round-trip a trivial query
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn pull_requests(&self) -> PullRequestRepository {
        PullRequestRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn teams(&self) -> TeamRepository {
        TeamRepository::new(self.pool.clone())
    }

    /// Close the database connection
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl StoreHealth for Database {
    async fn ping(&self) -> StoreResult<()> {
        self.health_check().await.map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_connection() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        let config = DatabaseConfig::new(&db_path).with_max_connections(2);
        let db = Database::connect(config).await.unwrap();
        db.migrate().await.unwrap();
        db.health_check().await.unwrap();
        db.ping().await.unwrap();

        assert!(db_path.exists());
        db.close().await;
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::connect(DatabaseConfig::new(temp_dir.path().join("test.db")))
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_enforces_foreign_keys_and_wal() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::connect(DatabaseConfig::new(temp_dir.path().join("test.db")))
            .await
            .unwrap();

        let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(foreign_keys, 1);

        let journal_mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(journal_mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_ping_fails_after_close() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::connect(DatabaseConfig::new(temp_dir.path().join("test.db")))
            .await
            .unwrap();
        let handle = db.clone();
        db.close().await;

        assert!(handle.ping().await.is_err());
    }
}
