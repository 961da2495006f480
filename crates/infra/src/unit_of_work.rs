//! Transaction coordination for ledger and movement-log writes.
//!
//! Every mutation of `inventory` or `stock_movements` happens inside a [`UnitOfWork`]
//! handed out by the [`TransactionCoordinator`]. A unit of work wraps a native sqlx
//! transaction: it commits only when asked to, and rolls back on every other exit
//! (explicit rollback, error return, drop, or deadline expiry).

use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::instrument;

use stockledger_core::{DomainError, DomainResult};

use crate::error::map_sqlx_error;

/// An open, isolated unit of work. Dropping it without [`UnitOfWork::commit`] rolls back.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    /// Connection bound to this unit of work.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> DomainResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }

    /// Roll back explicitly. Failures are logged only: the connection discards the
    /// transaction either way.
    pub async fn rollback(self) {
        if let Err(e) = self.tx.rollback().await {
            tracing::warn!(error = %e, "rollback failed");
        }
    }
}

/// Sole gateway to write transactions against the ledger and the movement log.
#[derive(Debug, Clone)]
pub struct TransactionCoordinator {
    pool: SqlitePool,
    lock_timeout: Duration,
}

impl TransactionCoordinator {
    pub fn new(pool: SqlitePool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    /// Read-only access for queries that do not need a unit of work.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Open a unit of work.
    pub async fn begin(&self) -> DomainResult<UnitOfWork> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(UnitOfWork { tx })
    }

    /// Run `f` atomically: commit on `Ok`, roll back on `Err`.
    ///
    /// The whole unit of work (connection acquisition, lock waits, `f`, commit) must finish
    /// within the lock timeout, otherwise it is abandoned, rolled back and reported as
    /// [`DomainError::Busy`].
    #[instrument(skip_all, fields(lock_timeout_ms = self.lock_timeout.as_millis() as u64))]
    pub async fn run_atomic<T, F>(&self, f: F) -> DomainResult<T>
    where
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, DomainResult<T>> + Send,
        T: Send,
    {
        let work = async {
            let mut uow = self.begin().await?;
            let outcome = f(uow.conn()).await;
            match outcome {
                Ok(value) => {
                    uow.commit().await?;
                    Ok(value)
                }
                Err(err) => {
                    tracing::debug!(error = %err, "unit of work rolled back");
                    uow.rollback().await;
                    Err(err)
                }
            }
        };

        match tokio::time::timeout(self.lock_timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("unit of work exceeded lock timeout");
                Err(DomainError::busy(format!(
                    "could not complete within {} ms",
                    self.lock_timeout.as_millis()
                )))
            }
        }
    }
}
