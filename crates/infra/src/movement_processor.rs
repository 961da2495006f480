//! Movement processing: validate, check the catalog, then apply ledger postings and
//! append the log row inside one coordinator unit of work.

use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::instrument;

use stockledger_core::{DomainError, DomainResult, ProductId, WarehouseId};
use stockledger_inventory::{replay, MovementOutcome, MovementRequest, ValidatedMovement};

use crate::catalog::CatalogStore;
use crate::ledger;
use crate::movement_log::{self, CapturedQuantities};
use crate::unit_of_work::TransactionCoordinator;

/// Ledger quantity next to the quantity rebuilt from the movement log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub ledger_qty: i64,
    pub replayed_qty: i64,
    pub movements: usize,
    pub consistent: bool,
}

#[derive(Debug, Clone)]
pub struct MovementProcessor {
    catalog: CatalogStore,
    coordinator: TransactionCoordinator,
}

impl MovementProcessor {
    pub fn new(catalog: CatalogStore, coordinator: TransactionCoordinator) -> Self {
        Self { catalog, coordinator }
    }

    pub fn coordinator(&self) -> &TransactionCoordinator {
        &self.coordinator
    }

    /// Apply one movement. It either fully commits (ledger postings and one log row) or
    /// leaves no trace.
    #[instrument(skip(self, request), fields(movement_type = %request.movement_type, product_id = %request.product_id))]
    pub async fn process(&self, request: MovementRequest) -> DomainResult<MovementOutcome> {
        let movement = request.validate().inspect_err(|e| {
            tracing::debug!(error = %e, "movement rejected by validation");
        })?;
        self.ensure_catalog(&movement).await?;

        let result = self
            .coordinator
            .run_atomic(move |conn| Box::pin(apply(conn, movement)))
            .await;

        match &result {
            Ok(outcome) => tracing::info!(
                movement_id = %outcome.movement.id,
                warehouse_id = %outcome.movement.warehouse_id,
                after_qty_src = outcome.after_qty_src,
                after_qty_dst = ?outcome.after_qty_dst,
                "movement committed"
            ),
            Err(e @ DomainError::InsufficientStock { .. }) => {
                tracing::debug!(error = %e, "movement rejected")
            }
            Err(e) => tracing::warn!(error = %e, kind = e.kind(), "movement failed"),
        }
        result
    }

    /// Every referenced warehouse and the product must exist and be live.
    async fn ensure_catalog(&self, movement: &ValidatedMovement) -> DomainResult<()> {
        for warehouse_id in movement.warehouses() {
            self.catalog.get_warehouse(warehouse_id, false).await?;
        }
        self.catalog.get_product(movement.product_id(), false).await?;
        Ok(())
    }

    /// Compare the ledger with a replay of the log, both read from one snapshot.
    #[instrument(skip(self), err)]
    pub async fn reconcile(&self, warehouse_id: WarehouseId, product_id: ProductId) -> DomainResult<Reconciliation> {
        self.catalog.get_warehouse(warehouse_id, true).await?;
        self.catalog.get_product(product_id, true).await?;

        let mut uow = self.coordinator.begin().await?;
        let ledger_qty = ledger::get(uow.conn(), warehouse_id, product_id).await?;
        let history = movement_log::history(uow.conn(), warehouse_id, product_id).await?;
        uow.rollback().await;

        let replayed_qty = replay(&history, warehouse_id, product_id);
        if replayed_qty != ledger_qty {
            tracing::error!(%warehouse_id, %product_id, ledger_qty, replayed_qty, "ledger diverges from movement log");
        }
        Ok(Reconciliation {
            warehouse_id,
            product_id,
            ledger_qty,
            replayed_qty,
            movements: history.len(),
            consistent: replayed_qty == ledger_qty,
        })
    }
}

/// Ledger postings in order (debit before credit), then the log row.
async fn apply(conn: &mut SqliteConnection, movement: ValidatedMovement) -> DomainResult<MovementOutcome> {
    let product_id = movement.product_id();
    let postings = movement.postings();

    let source = postings.source;
    let src_after = ledger::adjust(&mut *conn, source.warehouse_id, product_id, source.delta).await?;
    let mut quantities = CapturedQuantities {
        src_before: src_after - source.delta,
        src_after,
        dst_before: None,
        dst_after: None,
    };
    if let Some(destination) = postings.destination {
        let dst_after = ledger::adjust(&mut *conn, destination.warehouse_id, product_id, destination.delta).await?;
        quantities.dst_before = Some(dst_after - destination.delta);
        quantities.dst_after = Some(dst_after);
    }

    let row = movement_log::append(conn, &movement, quantities).await?;
    Ok(MovementOutcome {
        after_qty_src: quantities.src_after,
        after_qty_dst: quantities.dst_after,
        movement: row,
    })
}
