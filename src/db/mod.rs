//! Database module - route lookup store
//!
//! Routes can live in an external table instead of the configuration file.
//! Two backends are supported: a networked PostgreSQL server (the usual
//! deployment) and an embedded SQLite file.

#[cfg(test)]
pub mod test_utils;

use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::LookupSettings;

/// Connection pool for one of the supported backends
#[derive(Debug, Clone)]
pub enum LookupPool {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

/// Database handle wrapping the lookup store connection pool
pub struct Database {
    pool: LookupPool,
}

impl Database {
    /// Open the lookup store described by the configuration
    pub async fn connect(settings: &LookupSettings) -> Result<Self> {
        match settings {
            LookupSettings::Sqlite { path } => {
                let path = path.to_string_lossy();
                Self::new(Some(path.as_ref())).await
            }
            LookupSettings::Postgres {
                host,
                user,
                password,
                database,
                port,
            } => {
                let options = PgConnectOptions::new()
                    .host(host)
                    .username(user)
                    .password(password)
                    .database(database)
                    .port(*port);

                // Lazy so an unreachable server surfaces per request, not at startup
                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .acquire_timeout(Duration::from_secs(5))
                    .connect_lazy_with(options);

                info!("Route store: postgres://{}@{}:{}/{}", user, host, port, database);
                Ok(Self {
                    pool: LookupPool::Postgres(pool),
                })
            }
        }
    }

    /// Open an embedded SQLite lookup store
    /// If path is None, uses in-memory database (for testing)
    pub async fn new(path: Option<&str>) -> Result<Self> {
        let conn_str = match path {
            Some(p) => format!("sqlite:{}?mode=rwc", p),
            None => "sqlite::memory:".to_string(),
        };

        let options = SqliteConnectOptions::from_str(&conn_str)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true);

        // A single connection keeps an in-memory database alive and shared
        let max_connections = if path.is_some() { 10 } else { 1 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let db = Self {
            pool: LookupPool::Sqlite(pool),
        };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Create the route tables in an embedded store
    ///
    /// External PostgreSQL stores are managed by their operators and are
    /// never migrated from here.
    async fn run_migrations(&self) -> Result<()> {
        let LookupPool::Sqlite(pool) = &self.pool else {
            return Ok(());
        };

        info!("Running route store migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS routes (
                route TEXT PRIMARY KEY,
                directory TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS route_flags (
                route TEXT PRIMARY KEY REFERENCES routes(route),
                accepts_uploads BOOLEAN NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(pool)
        .await?;

        info!("Route store migrations complete");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &LookupPool {
        &self.pool
    }

    /// Check if the store is reachable
    pub async fn health_check(&self) -> Result<()> {
        match &self.pool {
            LookupPool::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            LookupPool::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
        }
        Ok(())
    }
}
