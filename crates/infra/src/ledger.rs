//! Inventory ledger: current quantity per (warehouse, product).
//!
//! Reads may run anywhere; [`adjust`] takes a `&mut SqliteConnection` so it can only be
//! called with a connection that belongs to a coordinator unit of work.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, FromRow, QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::instrument;

use stockledger_core::{DomainError, DomainResult, Page, PageRequest, ProductId, WarehouseId};
use stockledger_inventory::{quantity_overflow, InventoryRecord};

use crate::error::map_sqlx_error;

/// Current quantity for the key; an unrecorded key holds zero.
pub async fn get<'e, E>(executor: E, warehouse_id: WarehouseId, product_id: ProductId) -> DomainResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    Ok(record(executor, warehouse_id, product_id).await?.qty)
}

/// The ledger record for the key, or an empty one if nothing was ever posted to it.
pub async fn record<'e, E>(
    executor: E,
    warehouse_id: WarehouseId,
    product_id: ProductId,
) -> DomainResult<InventoryRecord>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<(i64, Option<DateTime<Utc>>)> = sqlx::query_as(
        "SELECT qty, updated_at FROM inventory WHERE warehouse_id = ? AND product_id = ?",
    )
    .bind(warehouse_id.get())
    .bind(product_id.get())
    .fetch_optional(executor)
    .await
    .map_err(|e| map_sqlx_error("get_inventory", e))?;

    Ok(match row {
        Some((qty, updated_at)) => InventoryRecord {
            warehouse_id,
            product_id,
            qty,
            updated_at,
        },
        None => InventoryRecord::empty(warehouse_id, product_id),
    })
}

/// Apply `delta` to the key and return the new quantity.
///
/// 1. ensure the record exists (zero quantity); this write takes the store's write lock,
/// 2. apply the delta only if the result stays within `0..=i64::MAX`, in one conditional
///    statement,
/// 3. if nothing was updated, a debit would overdraw (`InsufficientStock`) and a credit
///    would overflow (`Validation`).
///
/// The caller's unit of work is left untouched on failure; rolling it back is the
/// coordinator's job.
#[instrument(skip(conn), err)]
pub async fn adjust(
    conn: &mut SqliteConnection,
    warehouse_id: WarehouseId,
    product_id: ProductId,
    delta: i64,
) -> DomainResult<i64> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO inventory (warehouse_id, product_id, qty, created_at)
        VALUES (?, ?, 0, ?)
        ON CONFLICT (warehouse_id, product_id) DO NOTHING
        "#,
    )
    .bind(warehouse_id.get())
    .bind(product_id.get())
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| match map_sqlx_error("ensure_inventory_row", e) {
        DomainError::Referenced(_) => DomainError::not_found(format!(
            "warehouse {warehouse_id} or product {product_id}"
        )),
        other => other,
    })?;

    let updated: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE inventory
        SET qty = qty + ?, updated_at = ?
        WHERE warehouse_id = ? AND product_id = ? AND qty + ? >= 0 AND qty <= ?
        RETURNING qty
        "#,
    )
    .bind(delta)
    .bind(now)
    .bind(warehouse_id.get())
    .bind(product_id.get())
    .bind(delta)
    // Headroom check; SQLite would otherwise promote an overflowing sum to REAL.
    .bind(i64::MAX - delta.max(0))
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("adjust_inventory", e))?;

    match updated {
        Some(qty) => Ok(qty),
        None if delta > 0 => Err(quantity_overflow(warehouse_id, product_id)),
        None => {
            let available = get(&mut *conn, warehouse_id, product_id).await?;
            Err(DomainError::InsufficientStock {
                warehouse_id,
                product_id,
                available,
                requested: -delta,
            })
        }
    }
}

/// One ledger row joined with its catalog entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryLine {
    pub warehouse_id: WarehouseId,
    pub warehouse_name: String,
    pub product_id: ProductId,
    pub sku: String,
    pub product_name: String,
    pub unit: String,
    pub qty: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<'r> FromRow<'r, SqliteRow> for InventoryLine {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(InventoryLine {
            warehouse_id: WarehouseId::new(row.try_get("warehouse_id")?),
            warehouse_name: row.try_get("warehouse_name")?,
            product_id: ProductId::new(row.try_get("product_id")?),
            sku: row.try_get("sku")?,
            product_name: row.try_get("product_name")?,
            unit: row.try_get("unit")?,
            qty: row.try_get("qty")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Filters for [`list`]. `q` matches SKU or product name (substring).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryFilter {
    pub warehouse_id: Option<WarehouseId>,
    pub product_id: Option<ProductId>,
    pub q: Option<String>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &InventoryFilter) {
    qb.push(" WHERE w.deleted_at IS NULL AND p.deleted_at IS NULL");
    if let Some(w) = filter.warehouse_id {
        qb.push(" AND i.warehouse_id = ").push_bind(w.get());
    }
    if let Some(p) = filter.product_id {
        qb.push(" AND i.product_id = ").push_bind(p.get());
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{q}%");
        qb.push(" AND (p.sku LIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.name LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

const FROM_JOINED: &str = r#"
    FROM inventory i
    JOIN warehouses w ON w.id = i.warehouse_id
    JOIN products p ON p.id = i.product_id
"#;

/// Paginated ledger listing restricted to live warehouses and products.
#[instrument(skip(pool), err)]
pub async fn list(
    pool: &SqlitePool,
    filter: &InventoryFilter,
    page: PageRequest,
) -> DomainResult<Page<InventoryLine>> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*)");
    count.push(FROM_JOINED);
    push_filters(&mut count, filter);
    let total: i64 = count
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .map_err(|e| map_sqlx_error("count_inventory", e))?;

    let mut items = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT i.warehouse_id, w.name AS warehouse_name, i.product_id, p.sku,
               p.name AS product_name, p.unit, i.qty, i.updated_at
        "#,
    );
    items.push(FROM_JOINED);
    push_filters(&mut items, filter);
    items
        .push(" ORDER BY i.warehouse_id, i.product_id LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows = items
        .build_query_as::<InventoryLine>()
        .fetch_all(pool)
        .await
        .map_err(|e| map_sqlx_error("list_inventory", e))?;

    Ok(Page::new(page, total, rows))
}
