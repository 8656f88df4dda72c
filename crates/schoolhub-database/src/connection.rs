//! PostgreSQL connection pool management and the connection gateway.
//!
//! The [`Gateway`] is the only component that touches pooled connections.
//! Every logical operation acquires one connection, optionally sets the
//! session access mode, runs, and hands the connection back to the pool
//! when the guard drops (success, error, panic or cancellation alike).

use std::fmt;
use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgArguments, PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::{Connection, Postgres};
use tracing::{debug, info, warn};

use schoolhub_core::config::{DatabaseConfig, SessionPolicy};
use schoolhub_core::error::{AppError, ErrorKind};
use schoolhub_core::result::AppResult;

use crate::error::classify;

/// Whether an operation only reads or also writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// The operation issues only `SELECT` statements.
    Read,
    /// The operation inserts, updates or deletes.
    Write,
}

/// Session access mode set on a freshly acquired connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// `READ ONLY` transactions.
    ReadOnly,
    /// `READ WRITE` transactions.
    ReadWrite,
}

/// Restores the server's default access mode on a released connection.
pub const RESET_SESSION_MODE: &str = "RESET default_transaction_read_only";

impl SessionMode {
    /// The statement that puts a session into this mode.
    pub fn statement(&self) -> &'static str {
        match self {
            Self::ReadOnly => "SET SESSION CHARACTERISTICS AS TRANSACTION READ ONLY",
            Self::ReadWrite => "SET SESSION CHARACTERISTICS AS TRANSACTION READ WRITE",
        }
    }

    /// Resolve the mode for an operation under the configured policy.
    ///
    /// `None` means no session statement is issued.
    pub fn resolve(policy: SessionPolicy, intent: Intent) -> Option<Self> {
        match (policy, intent) {
            (SessionPolicy::Off, _) => None,
            (SessionPolicy::ReadOnly, _) => Some(Self::ReadOnly),
            (SessionPolicy::ByIntent, Intent::Read) => Some(Self::ReadOnly),
            (SessionPolicy::ByIntent, Intent::Write) => Some(Self::ReadWrite),
        }
    }
}

/// Context of one logical data-access operation.
///
/// Carried into the gateway so that session mode, logging and error
/// context all come from the same place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Entity the operation works on, e.g. `Classroom`.
    pub entity: &'static str,
    /// Operation name, e.g. `list`.
    pub name: &'static str,
    /// Read or write.
    pub intent: Intent,
}

impl Operation {
    /// A read-only operation.
    pub const fn read(entity: &'static str, name: &'static str) -> Self {
        Self {
            entity,
            name,
            intent: Intent::Read,
        }
    }

    /// A writing operation.
    pub const fn write(entity: &'static str, name: &'static str) -> Self {
        Self {
            entity,
            name,
            intent: Intent::Write,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity, self.name)
    }
}

/// Wrapper around the sqlx PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    /// The underlying sqlx connection pool.
    pool: PgPool,
    /// Session policy applied by gateways built from this pool.
    policy: SessionPolicy,
}

impl DatabasePool {
    /// Create a new database pool from configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            url = %mask_password(&config.url),
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            session_policy = ?config.session_policy,
            "Connecting to PostgreSQL"
        );

        let mut options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));
        if config.session_policy != SessionPolicy::Off {
            // Gateway operations leave their mode on the session; direct
            // pool users must not inherit it.
            options = options.after_release(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query(RESET_SESSION_MODE).execute(&mut *conn).await?;
                    Ok(true)
                })
            });
        }

        let pool = options
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ConnectionUnavailable,
                    format!("Failed to connect to database: {e}"),
                    e,
                )
            })?;

        info!("Successfully connected to PostgreSQL");
        Ok(Self {
            pool,
            policy: config.session_policy,
        })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool, policy: SessionPolicy) -> Self {
        Self { pool, policy }
    }

    /// Return a reference to the underlying sqlx pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Build a connection gateway over this pool.
    pub fn gateway(&self) -> Gateway {
        Gateway::new(self.pool.clone(), self.policy)
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| {
                AppError::with_source(ErrorKind::ConnectionUnavailable, "Health check failed", e)
            })
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

/// Acquires pooled connections for operations and runs statements on them.
#[derive(Debug, Clone)]
pub struct Gateway {
    pool: PgPool,
    policy: SessionPolicy,
}

impl Gateway {
    /// Create a gateway over a pool.
    pub fn new(pool: PgPool, policy: SessionPolicy) -> Self {
        Self { pool, policy }
    }

    /// The configured session policy.
    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Acquire a connection for `op` and put it into the resolved session mode.
    ///
    /// The mode statement is issued on every acquisition because pooled
    /// connections are shared between callers with different intents.
    pub async fn acquire(&self, op: Operation) -> AppResult<PoolConnection<Postgres>> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            warn!(entity = op.entity, operation = op.name, error = %e, "Connection unavailable");
            AppError::with_source(
                ErrorKind::ConnectionUnavailable,
                format!("{op}: no database connection available"),
                e,
            )
        })?;

        if let Some(mode) = SessionMode::resolve(self.policy, op.intent) {
            sqlx::query(mode.statement())
                .execute(&mut *conn)
                .await
                .map_err(|e| classify(op, e))?;
        }
        Ok(conn)
    }

    /// Run `f` on one acquired connection.
    pub async fn run<T, F>(&self, op: Operation, f: F) -> AppResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, AppResult<T>> + Send,
    {
        let mut conn = self.acquire(op).await?;
        f(&mut *conn).await
    }

    /// Run `f` inside a transaction on one acquired connection.
    ///
    /// Commits when `f` succeeds; rolls back before releasing the connection
    /// when it fails.
    pub async fn transaction<T, F>(&self, op: Operation, f: F) -> AppResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, AppResult<T>> + Send,
    {
        let mut conn = self.acquire(op).await?;
        let mut tx = conn.begin().await.map_err(|e| classify(op, e))?;

        match f(&mut *tx).await {
            Ok(value) => {
                tx.commit().await.map_err(|e| classify(op, e))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(entity = op.entity, operation = op.name, error = %rollback, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Run a query and return all rows.
    pub async fn fetch_all(
        &self,
        op: Operation,
        sql: &str,
        args: PgArguments,
    ) -> AppResult<Vec<PgRow>> {
        debug!(entity = op.entity, operation = op.name, sql, "fetch_all");
        let mut conn = self.acquire(op).await?;
        sqlx::query_with(sql, args)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| classify(op, e))
    }

    /// Run a query expected to return zero or one row.
    pub async fn fetch_optional(
        &self,
        op: Operation,
        sql: &str,
        args: PgArguments,
    ) -> AppResult<Option<PgRow>> {
        debug!(entity = op.entity, operation = op.name, sql, "fetch_optional");
        let mut conn = self.acquire(op).await?;
        sqlx::query_with(sql, args)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| classify(op, e))
    }

    /// Run a statement and return the number of affected rows.
    pub async fn execute(&self, op: Operation, sql: &str, args: PgArguments) -> AppResult<u64> {
        debug!(entity = op.entity, operation = op.name, sql, "execute");
        let mut conn = self.acquire(op).await?;
        sqlx::query_with(sql, args)
            .execute(&mut *conn)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| classify(op, e))
    }
}

/// Mask the password portion of a database URL for safe logging.
fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
            if colon_pos > scheme_end {
                return format!("{}:****@{}", &url[..colon_pos], &url[at_pos + 1..]);
            }
        }
    }
    url.to_string()
}
