use async_trait::async_trait;
use orgair_config::{models::redact, DatabaseConfig};
use orgair_domain::{StoreAccessPort, StoreRow, StoreValue};
use orgair_errors::{OrgAirError, OrgAirResult};
use std::time::Duration;
use tracing::{debug, info};

use super::{postgres, sqlite};

/// Database type detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    PostgreSQL,
    SQLite,
}

impl DatabaseType {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            DatabaseType::PostgreSQL
        } else {
            DatabaseType::SQLite
        }
    }
}

/// Database connection pool
#[derive(Debug, Clone)]
pub enum DatabasePool {
    PostgreSQL(sqlx::PgPool),
    SQLite(sqlx::SqlitePool),
}

impl DatabasePool {
    /// Create pool and open the minimum number of connections eagerly
    pub async fn connect(config: &DatabaseConfig) -> OrgAirResult<Self> {
        let url = Self::url(config)?;
        info!(url = %redact(url), "connecting to configuration store");

        match DatabaseType::from_url(url) {
            DatabaseType::PostgreSQL => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
                    .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
                    .connect(url)
                    .await?;
                Ok(DatabasePool::PostgreSQL(pool))
            }
            DatabaseType::SQLite => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
                    .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
                    .connect(url)
                    .await?;
                Ok(DatabasePool::SQLite(pool))
            }
        }
    }

    /// Create pool without touching the network; connections open on first use
    pub fn connect_lazy(config: &DatabaseConfig) -> OrgAirResult<Self> {
        let url = Self::url(config)?;

        match DatabaseType::from_url(url) {
            DatabaseType::PostgreSQL => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
                    .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
                    .connect_lazy(url)?;
                Ok(DatabasePool::PostgreSQL(pool))
            }
            DatabaseType::SQLite => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
                    .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
                    .connect_lazy(url)?;
                Ok(DatabasePool::SQLite(pool))
            }
        }
    }

    fn url(config: &DatabaseConfig) -> OrgAirResult<&str> {
        config
            .url
            .as_deref()
            .ok_or_else(|| OrgAirError::store_unavailable("DATABASE_URL not set"))
    }

    pub fn database_type(&self) -> DatabaseType {
        match self {
            DatabasePool::PostgreSQL(_) => DatabaseType::PostgreSQL,
            DatabasePool::SQLite(_) => DatabaseType::SQLite,
        }
    }

    pub async fn health_check(&self) -> OrgAirResult<()> {
        match self {
            DatabasePool::PostgreSQL(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            DatabasePool::SQLite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
        }
        Ok(())
    }

    pub async fn close(&self) {
        match self {
            DatabasePool::PostgreSQL(pool) => pool.close().await,
            DatabasePool::SQLite(pool) => pool.close().await,
        }
    }
}

/// Store access backed by a sqlx pool
///
/// Queries use `$n` placeholders, which both backends accept.
#[derive(Debug, Clone)]
pub struct SqlxStore {
    pool: DatabasePool,
}

impl SqlxStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

#[async_trait]
impl StoreAccessPort for SqlxStore {
    async fn fetch_one(
        &self,
        query: &str,
        params: &[StoreValue],
    ) -> OrgAirResult<Option<StoreRow>> {
        debug!(query, params = params.len(), "fetch_one");
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => postgres::fetch_one(pool, query, params).await,
            DatabasePool::SQLite(pool) => sqlite::fetch_one(pool, query, params).await,
        }
    }

    async fn fetch_many(&self, query: &str, params: &[StoreValue]) -> OrgAirResult<Vec<StoreRow>> {
        debug!(query, params = params.len(), "fetch_many");
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => postgres::fetch_many(pool, query, params).await,
            DatabasePool::SQLite(pool) => sqlite::fetch_many(pool, query, params).await,
        }
    }
}

/// Store used when no connection string is configured
///
/// Every call reports the store as unavailable, so reads degrade to absent
/// results instead of the process refusing to start.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredStore;

#[async_trait]
impl StoreAccessPort for UnconfiguredStore {
    async fn fetch_one(
        &self,
        _query: &str,
        _params: &[StoreValue],
    ) -> OrgAirResult<Option<StoreRow>> {
        Err(OrgAirError::store_unavailable("DATABASE_URL not set"))
    }

    async fn fetch_many(
        &self,
        _query: &str,
        _params: &[StoreValue],
    ) -> OrgAirResult<Vec<StoreRow>> {
        Err(OrgAirError::store_unavailable("DATABASE_URL not set"))
    }
}
