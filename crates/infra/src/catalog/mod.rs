//! SQLite-backed catalog store for warehouses and products.
//!
//! Soft-deleted rows stay in their tables (and keep satisfying foreign keys from the
//! ledger and the movement log); the partial unique indexes only cover live rows, so a
//! code or SKU can be reused once its previous owner is deleted.

mod products;
mod warehouses;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use stockledger_core::DomainError;

use crate::error::map_sqlx_error;

/// Catalog listing filter. `q` is a substring match on name and business key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub include_deleted: bool,
}

impl CatalogQuery {
    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>, key_column: &str) {
        qb.push(" WHERE 1 = 1");
        if !self.include_deleted {
            qb.push(" AND deleted_at IS NULL");
        }
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{q}%");
            qb.push(" AND (name LIKE ")
                .push_bind(pattern.clone())
                .push(format!(" OR {key_column} LIKE "))
                .push_bind(pattern)
                .push(")");
        }
    }
}

/// Durable warehouse and product records.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Map a write error, turning a unique violation into a message naming the key.
fn map_write_error(operation: &str, what: &str, key: &str, err: sqlx::Error) -> DomainError {
    match map_sqlx_error(operation, err) {
        DomainError::DuplicateKey(_) => DomainError::duplicate_key(format!("{what} '{key}' already exists")),
        other => other,
    }
}

/// Hard deletes fail on foreign keys when the row still backs ledger or log entries.
fn map_hard_delete_error(what: &str, id: i64, err: sqlx::Error) -> DomainError {
    match map_sqlx_error("hard_delete", err) {
        DomainError::Referenced(_) => DomainError::referenced(format!(
            "{what} {id} is referenced by inventory or stock movements"
        )),
        other => other,
    }
}
