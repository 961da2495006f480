use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite};
use tracing::instrument;

use stockledger_catalog::{Lifecycle, NewWarehouse, Warehouse, WarehousePatch};
use stockledger_core::{DomainError, DomainResult, Page, PageRequest, WarehouseId};

use super::{map_hard_delete_error, map_write_error, CatalogQuery, CatalogStore};
use crate::error::map_sqlx_error;

struct WarehouseRow(Warehouse);

impl<'r> FromRow<'r, SqliteRow> for WarehouseRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let deleted_at: Option<DateTime<Utc>> = row.try_get("deleted_at")?;
        Ok(WarehouseRow(Warehouse {
            id: WarehouseId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            code: row.try_get("code")?,
            address: row.try_get("address")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            lifecycle: Lifecycle::from_deleted_at(deleted_at),
        }))
    }
}

const SELECT: &str = "SELECT id, name, code, address, created_at, updated_at, deleted_at FROM warehouses";
const RETURNING: &str = " RETURNING id, name, code, address, created_at, updated_at, deleted_at";

impl CatalogStore {
    #[instrument(skip(self, input), fields(code = input.code()), err)]
    pub async fn create_warehouse(&self, input: &NewWarehouse) -> DomainResult<Warehouse> {
        let row: WarehouseRow = sqlx::query_as(&format!(
            "INSERT INTO warehouses (name, code, address, created_at) VALUES (?, ?, ?, ?){RETURNING}"
        ))
        .bind(input.name())
        .bind(input.code())
        .bind(input.address())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error("create_warehouse", "warehouse code", input.code(), e))?;

        tracing::info!(warehouse_id = %row.0.id, "warehouse created");
        Ok(row.0)
    }

    pub async fn get_warehouse(&self, id: WarehouseId, include_deleted: bool) -> DomainResult<Warehouse> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT);
        qb.push(" WHERE id = ").push_bind(id.get());
        if !include_deleted {
            qb.push(" AND deleted_at IS NULL");
        }
        qb.build_query_as::<WarehouseRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_warehouse", e))?
            .map(|row| row.0)
            .ok_or_else(|| DomainError::not_found(format!("warehouse {id}")))
    }

    #[instrument(skip(self), err)]
    pub async fn list_warehouses(&self, query: &CatalogQuery, page: PageRequest) -> DomainResult<Page<Warehouse>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM warehouses");
        query.push_where(&mut count, "code");
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_warehouses", e))?;

        let mut items = QueryBuilder::<Sqlite>::new(SELECT);
        query.push_where(&mut items, "code");
        items
            .push(" ORDER BY id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = items
            .build_query_as::<WarehouseRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_warehouses", e))?;

        Ok(Page::new(page, total, rows.into_iter().map(|r| r.0).collect()))
    }

    /// Full replace of a live warehouse.
    #[instrument(skip(self, input), err)]
    pub async fn replace_warehouse(&self, id: WarehouseId, input: &NewWarehouse) -> DomainResult<Warehouse> {
        let row: Option<WarehouseRow> = sqlx::query_as(&format!(
            "UPDATE warehouses SET name = ?, code = ?, address = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL{RETURNING}"
        ))
        .bind(input.name())
        .bind(input.code())
        .bind(input.address())
        .bind(Utc::now())
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error("replace_warehouse", "warehouse code", input.code(), e))?;

        row.map(|r| r.0)
            .ok_or_else(|| DomainError::not_found(format!("warehouse {id}")))
    }

    pub async fn patch_warehouse(&self, id: WarehouseId, patch: &WarehousePatch) -> DomainResult<Warehouse> {
        if patch.is_empty() {
            return Err(DomainError::validation("patch must set at least one field"));
        }
        let current = self.get_warehouse(id, false).await?;
        let merged = patch.merge(&current)?;
        self.replace_warehouse(id, &merged).await
    }

    /// Soft delete by default; `hard` removes the row and fails `Referenced` while
    /// inventory or movements still point at it.
    #[instrument(skip(self), err)]
    pub async fn delete_warehouse(&self, id: WarehouseId, hard: bool) -> DomainResult<()> {
        let result = if hard {
            tracing::warn!(warehouse_id = %id, "hard delete requested");
            sqlx::query("DELETE FROM warehouses WHERE id = ?")
                .bind(id.get())
                .execute(&self.pool)
                .await
                .map_err(|e| map_hard_delete_error("warehouse", id.get(), e))?
        } else {
            sqlx::query("UPDATE warehouses SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
                .bind(Utc::now())
                .bind(id.get())
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("delete_warehouse", e))?
        };

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("warehouse {id}")));
        }
        Ok(())
    }
}
