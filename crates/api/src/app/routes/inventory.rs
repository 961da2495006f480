use std::sync::Arc;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use stockledger_core::{ProductId, WarehouseId};
use stockledger_infra::ledger;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_inventory))
        .route("/:warehouse_id/:product_id", get(get_stock))
        .route("/:warehouse_id/:product_id/reconcile", get(reconcile))
}

fn parse_key(
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<(WarehouseId, ProductId), axum::response::Response> {
    let Path((w, p)) = path.map_err(errors::rejection_to_response)?;
    let w = w.parse().map_err(errors::domain_error_to_response)?;
    let p = p.parse().map_err(errors::domain_error_to_response)?;
    Ok((w, p))
}

pub async fn list_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::InventoryListQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::rejection_to_response(e),
    };
    let (filter, page) = match query.into_parts() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match ledger::list(services.pool(), &filter, page).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Current quantity; a pair that never saw a movement reads zero.
pub async fn get_stock(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> axum::response::Response {
    let (warehouse_id, product_id) = match parse_key(path) {
        Ok(key) => key,
        Err(resp) => return resp,
    };

    match ledger::record(services.pool(), warehouse_id, product_id).await {
        Ok(record) => Json(json!({
            "warehouseId": record.warehouse_id,
            "productId": record.product_id,
            "qty": record.qty,
        }))
        .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn reconcile(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> axum::response::Response {
    let (warehouse_id, product_id) = match parse_key(path) {
        Ok(key) => key,
        Err(resp) => return resp,
    };

    match services.processor.reconcile(warehouse_id, product_id).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
