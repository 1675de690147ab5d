//! Database - lazily initialized connection and guarded query execution
//!
//! The connection handle is explicit and constructor-injected rather than a
//! process global. It is created on first use, liveness-checked before every
//! reuse, and never recreated within the life of the process.

use crate::config::DatabaseConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::sql::BoundedSql;
use futures_util::{pin_mut, TryStreamExt};
use tokio::sync::{Mutex, OnceCell};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};

pub mod row;

pub use row::{ResultRow, SqlValue};

fn slice_iter<'a>(
    s: &'a [&'a (dyn ToSql + Sync)],
) -> impl ExactSizeIterator<Item = &'a dyn ToSql> + 'a {
    s.iter().map(|s| *s as _)
}

/// Shared database handle.
///
/// One connection per process, initialized once and read-shared afterwards.
/// Execution takes the mutex for the duration of a statement, which also
/// gives each call an exclusive transaction scope.
pub struct Database {
    config: DatabaseConfig,
    statement_timeout_ms: u64,
    client: OnceCell<Mutex<Client>>,
}

impl Database {
    pub fn new(config: DatabaseConfig, statement_timeout_ms: u64) -> Self {
        Self {
            config,
            statement_timeout_ms,
            client: OnceCell::new(),
        }
    }

    async fn connect(config: &DatabaseConfig) -> PipelineResult<Client> {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&config.host)
            .port(config.port)
            .dbname(&config.dbname)
            .user(&config.user)
            .password(&config.password)
            .connect_timeout(std::time::Duration::from_secs(10));

        let (client, connection) = pg.connect(NoTls).await.map_err(|e| {
            tracing::error!(error = %e, host = %config.host, "database connection failed");
            PipelineError::ExecutionFailed("could not connect to database".to_string())
        })?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "database connection task ended");
            }
        });

        tracing::info!(host = %config.host, dbname = %config.dbname, "database connection established");
        Ok(client)
    }

    async fn client(&self) -> PipelineResult<&Mutex<Client>> {
        self.client
            .get_or_try_init(|| async {
                Self::connect(&self.config).await.map(Mutex::new)
            })
            .await
    }

    /// Execute a bounded, validated statement and materialize at most
    /// `ceiling` rows.
    ///
    /// Per call: one transaction, a `SET LOCAL statement_timeout` before the
    /// query, and a fetch-side row cap independent of the statement's LIMIT
    /// clause. Timeout bounds time, LIMIT bounds rows requested, the fetch
    /// cap bounds rows materialized.
    pub async fn execute(&self, sql: &BoundedSql, ceiling: usize) -> PipelineResult<Vec<ResultRow>> {
        let cell = self.client().await?;
        let mut client = cell.lock().await;

        // Liveness probe before reuse; a dead connection is surfaced, not
        // silently replaced
        if client.is_closed() {
            return Err(PipelineError::ExecutionFailed(
                "database connection lost".to_string(),
            ));
        }
        client
            .simple_query("SELECT 1")
            .await
            .map_err(map_execute_error)?;

        let tx = client.transaction().await.map_err(map_execute_error)?;
        tx.batch_execute(&format!(
            "SET LOCAL statement_timeout = {}",
            self.statement_timeout_ms
        ))
        .await
        .map_err(map_execute_error)?;

        let stream = tx
            .query_raw(sql.as_str(), slice_iter(&[]))
            .await
            .map_err(map_execute_error)?;
        pin_mut!(stream);

        let mut rows = Vec::new();
        while let Some(row) = stream.try_next().await.map_err(map_execute_error)? {
            if rows.len() >= ceiling {
                break;
            }
            rows.push(ResultRow::from_row(&row));
        }

        // Read-only statement: commit and rollback are equally safe
        tx.commit().await.map_err(map_execute_error)?;

        Ok(rows)
    }
}

/// Map a driver error to a short machine-readable cause. The raw error goes
/// to the log; credentials and driver internals never reach the caller.
fn map_execute_error(e: tokio_postgres::Error) -> PipelineError {
    tracing::error!(error = %e, "query execution failed");
    if e.code() == Some(&SqlState::QUERY_CANCELED) {
        return PipelineError::ExecutionFailed("statement timeout exceeded".to_string());
    }
    if let Some(db) = e.as_db_error() {
        return PipelineError::ExecutionFailed(format!("database error {}", db.code().code()));
    }
    PipelineError::ExecutionFailed("database connection error".to_string())
}
