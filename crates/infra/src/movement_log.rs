//! Append-only movement log.
//!
//! Rows are inserted once, inside the same unit of work as the ledger update they
//! describe, and never updated or deleted (the schema rejects both with triggers).

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, FromRow, QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::instrument;

use stockledger_core::{
    DomainError, DomainResult, MovementId, Page, PageRequest, ProductId, Quantity, WarehouseId,
};
use stockledger_inventory::{MovementType, StockMovement, ValidatedMovement};

use crate::error::map_sqlx_error;

/// Ledger quantities around a movement, captured inside its unit of work.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CapturedQuantities {
    pub src_before: i64,
    pub src_after: i64,
    pub dst_before: Option<i64>,
    pub dst_after: Option<i64>,
}

/// Append one committed-to-be movement row.
#[instrument(skip(conn, movement), fields(movement_type = %movement.movement_type()), err)]
pub async fn append(
    conn: &mut SqliteConnection,
    movement: &ValidatedMovement,
    quantities: CapturedQuantities,
) -> DomainResult<StockMovement> {
    let created_at = Utc::now();

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO stock_movements (
            movement_type,
            warehouse_id,
            warehouse_to_id,
            product_id,
            qty,
            reason,
            ref_no,
            src_qty_before,
            src_qty_after,
            dst_qty_before,
            dst_qty_after,
            created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(movement.movement_type().as_str())
    .bind(movement.warehouse_id().get())
    .bind(movement.warehouse_to_id().map(WarehouseId::get))
    .bind(movement.product_id().get())
    .bind(movement.qty().get())
    .bind(movement.reason())
    .bind(movement.ref_no())
    .bind(quantities.src_before)
    .bind(quantities.src_after)
    .bind(quantities.dst_before)
    .bind(quantities.dst_after)
    .bind(created_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("append_movement", e))?;

    Ok(StockMovement {
        id: MovementId::new(id),
        movement_type: movement.movement_type(),
        warehouse_id: movement.warehouse_id(),
        warehouse_to_id: movement.warehouse_to_id(),
        product_id: movement.product_id(),
        qty: movement.qty(),
        reason: movement.reason().map(str::to_string),
        ref_no: movement.ref_no().map(str::to_string),
        created_at,
        src_qty_before: quantities.src_before,
        src_qty_after: quantities.src_after,
        dst_qty_before: quantities.dst_before,
        dst_qty_after: quantities.dst_after,
    })
}

#[derive(Debug)]
struct MovementRow {
    id: i64,
    movement_type: String,
    warehouse_id: i64,
    warehouse_to_id: Option<i64>,
    product_id: i64,
    qty: i64,
    reason: Option<String>,
    ref_no: Option<String>,
    src_qty_before: i64,
    src_qty_after: i64,
    dst_qty_before: Option<i64>,
    dst_qty_after: Option<i64>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for MovementRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(MovementRow {
            id: row.try_get("id")?,
            movement_type: row.try_get("movement_type")?,
            warehouse_id: row.try_get("warehouse_id")?,
            warehouse_to_id: row.try_get("warehouse_to_id")?,
            product_id: row.try_get("product_id")?,
            qty: row.try_get("qty")?,
            reason: row.try_get("reason")?,
            ref_no: row.try_get("ref_no")?,
            src_qty_before: row.try_get("src_qty_before")?,
            src_qty_after: row.try_get("src_qty_after")?,
            dst_qty_before: row.try_get("dst_qty_before")?,
            dst_qty_after: row.try_get("dst_qty_after")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = DomainError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let corrupt = |e: DomainError| DomainError::storage(format!("corrupt movement row {}: {e}", row.id));
        Ok(StockMovement {
            id: MovementId::new(row.id),
            movement_type: row.movement_type.parse::<MovementType>().map_err(corrupt)?,
            warehouse_id: WarehouseId::new(row.warehouse_id),
            warehouse_to_id: row.warehouse_to_id.map(WarehouseId::new),
            product_id: ProductId::new(row.product_id),
            qty: Quantity::new(row.qty).map_err(corrupt)?,
            reason: row.reason,
            ref_no: row.ref_no,
            created_at: row.created_at,
            src_qty_before: row.src_qty_before,
            src_qty_after: row.src_qty_after,
            dst_qty_before: row.dst_qty_before,
            dst_qty_after: row.dst_qty_after,
        })
    }
}

const COLUMNS: &str = r#"
    SELECT id, movement_type, warehouse_id, warehouse_to_id, product_id, qty, reason, ref_no,
           src_qty_before, src_qty_after, dst_qty_before, dst_qty_after, created_at
    FROM stock_movements
"#;

/// Filters for [`list`].
///
/// `warehouse_id` matches either side of a transfer; `ref_no` is a substring match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub warehouse_id: Option<WarehouseId>,
    pub product_id: Option<ProductId>,
    pub movement_type: Option<MovementType>,
    pub ref_no: Option<String>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &MovementFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(w) = filter.warehouse_id {
        qb.push(" AND (warehouse_id = ")
            .push_bind(w.get())
            .push(" OR warehouse_to_id = ")
            .push_bind(w.get())
            .push(")");
    }
    if let Some(p) = filter.product_id {
        qb.push(" AND product_id = ").push_bind(p.get());
    }
    if let Some(t) = filter.movement_type {
        qb.push(" AND movement_type = ").push_bind(t.as_str());
    }
    if let Some(r) = filter.ref_no.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        qb.push(" AND ref_no LIKE ").push_bind(format!("%{r}%"));
    }
}

fn into_movements(rows: Vec<MovementRow>) -> DomainResult<Vec<StockMovement>> {
    rows.into_iter().map(StockMovement::try_from).collect()
}

/// Paginated movement history, newest first.
#[instrument(skip(pool), err)]
pub async fn list(
    pool: &SqlitePool,
    filter: &MovementFilter,
    page: PageRequest,
) -> DomainResult<Page<StockMovement>> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM stock_movements");
    push_filters(&mut count, filter);
    let total: i64 = count
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .map_err(|e| map_sqlx_error("count_movements", e))?;

    let mut items = QueryBuilder::<Sqlite>::new(COLUMNS);
    push_filters(&mut items, filter);
    items
        .push(" ORDER BY id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows = items
        .build_query_as::<MovementRow>()
        .fetch_all(pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;

    Ok(Page::new(page, total, into_movements(rows)?))
}

/// Every movement that touched the key, oldest first.
pub async fn history<'e, E>(
    executor: E,
    warehouse_id: WarehouseId,
    product_id: ProductId,
) -> DomainResult<Vec<StockMovement>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut qb = QueryBuilder::<Sqlite>::new(COLUMNS);
    qb.push(" WHERE product_id = ")
        .push_bind(product_id.get())
        .push(" AND (warehouse_id = ")
        .push_bind(warehouse_id.get())
        .push(" OR warehouse_to_id = ")
        .push_bind(warehouse_id.get())
        .push(") ORDER BY id ASC");

    let rows = qb
        .build_query_as::<MovementRow>()
        .fetch_all(executor)
        .await
        .map_err(|e| map_sqlx_error("movement_history", e))?;

    into_movements(rows)
}
