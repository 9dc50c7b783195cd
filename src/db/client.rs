//! Pooled PostgreSQL access.
//!
//! [`DbClient`] owns a `deadpool-postgres` pool. Connections and sessions are
//! RAII guards: dropping one, on any path including a cancelled request
//! future, hands its connection back to the pool. A session transaction that
//! is dropped without [`commit`](SessionTransaction::commit) is rolled back.

use std::ops::Deref;
use std::time::Duration;

use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod, Runtime};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::types::FromSqlOwned;
use tokio_postgres::{NoTls, Row};
use tracing::{debug, info};

use crate::db::config::{DbConfig, SslMode};
use crate::db::params::{CONNECT_TIMEOUT_SECS, get_connection_parameters};
use crate::db::ssl::{SslInfo, verify_ssl};
use crate::error::{Error, Result};

const POOL_MAX_SIZE: usize = 16;

/// Handle to the application database. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Builds the pool for `config`.
    ///
    /// The pool connects lazily. With `check_db_connection`, one connection is
    /// opened immediately and its TLS state is logged via [`verify_ssl`]; an
    /// unreachable database then fails here with [`Error::Connection`].
    pub async fn new(config: &DbConfig, check_db_connection: bool) -> Result<Self> {
        let mut pg_config = get_connection_parameters(config).to_pg_config()?;
        pg_config.ssl_mode(match config.ssl_mode {
            SslMode::Disable => tokio_postgres::config::SslMode::Disable,
            SslMode::Prefer => tokio_postgres::config::SslMode::Prefer,
            SslMode::Require => tokio_postgres::config::SslMode::Require,
        });

        let manager_config = ManagerConfig { recycling_method: RecyclingMethod::Fast };
        let manager = match config.ssl_mode {
            SslMode::Disable => Manager::from_config(pg_config, NoTls, manager_config),
            SslMode::Prefer | SslMode::Require => {
                Manager::from_config(pg_config, tls_connector()?, manager_config)
            }
        };

        let pool = Pool::builder(manager)
            .max_size(POOL_MAX_SIZE)
            .wait_timeout(Some(Duration::from_secs(CONNECT_TIMEOUT_SECS)))
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| Error::Config(format!("failed to build database pool: {e}")))?;

        info!(
            host = %config.host,
            port = %config.port,
            dbname = %config.name,
            ssl_mode = %config.ssl_mode,
            "database pool created"
        );

        let client = Self { pool };
        if check_db_connection {
            client.check_db_connection().await?;
        }
        Ok(client)
    }

    /// Opens a connection and logs whether it is encrypted.
    pub async fn check_db_connection(&self) -> Result<()> {
        let conn = self.get_connection().await?;
        let ssl_info = SslInfo::query(&conn).await?;
        verify_ssl(&ssl_info)
    }

    /// Checks out a connection. It returns to the pool when dropped.
    pub async fn get_connection(&self) -> Result<Connection> {
        Ok(Connection { inner: self.pool.get().await? })
    }

    /// Checks out a connection for a unit of work.
    pub async fn get_session(&self) -> Result<Session> {
        Ok(Session { inner: self.pool.get().await? })
    }

    /// Round-trips `SELECT 1`.
    pub async fn ping(&self) -> Result<()> {
        let one: i32 = self.get_connection().await?.scalar("SELECT 1").await?;
        if one != 1 {
            return Err(Error::Connection(format!("unexpected ping result {one}")));
        }
        Ok(())
    }
}

/// libpq semantics for `prefer`/`require`: encrypt, but do not verify the
/// server certificate.
fn tls_connector() -> Result<MakeTlsConnector> {
    let connector = TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .map_err(|e| Error::Config(format!("failed to build TLS connector: {e}")))?;
    Ok(MakeTlsConnector::new(connector))
}

fn first_column<T: FromSqlOwned>(row: Row) -> Result<T> {
    Ok(row.try_get(0)?)
}

// ── Connection ────────────────────────────────────────────────────────────────

/// A pooled connection in autocommit mode.
///
/// Derefs to [`tokio_postgres::Client`] for the full query API.
pub struct Connection {
    inner: Object,
}

impl Connection {
    /// Runs `sql` and returns the first column of its single row.
    pub async fn scalar<T: FromSqlOwned>(&self, sql: &str) -> Result<T> {
        first_column(self.inner.query_one(sql, &[]).await?)
    }
}

impl Deref for Connection {
    type Target = tokio_postgres::Client;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// A pooled connection used as a unit of work.
///
/// Statements run directly on the session autocommit. Group them with
/// [`begin`](Session::begin).
pub struct Session {
    inner: Object,
}

impl Session {
    /// Opens a transaction scope on this session.
    pub async fn begin(&mut self) -> Result<SessionTransaction<'_>> {
        debug!("begin transaction");
        Ok(SessionTransaction { tx: self.inner.transaction().await? })
    }

    /// Runs `sql` outside any transaction scope.
    pub async fn scalar<T: FromSqlOwned>(&self, sql: &str) -> Result<T> {
        first_column(self.inner.query_one(sql, &[]).await?)
    }
}

/// An open transaction. Dropping it without [`commit`](Self::commit) rolls back.
pub struct SessionTransaction<'a> {
    tx: deadpool_postgres::Transaction<'a>,
}

impl SessionTransaction<'_> {
    /// Runs `sql` inside the transaction and returns the first column of its single row.
    pub async fn scalar<T: FromSqlOwned>(&self, sql: &str) -> Result<T> {
        first_column(self.tx.query_one(sql, &[]).await?)
    }

    /// Runs `sql` inside the transaction, returning the number of rows affected.
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        Ok(self.tx.execute(sql, &[]).await?)
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        debug!("transaction committed");
        Ok(())
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        debug!("transaction rolled back");
        Ok(())
    }
}
