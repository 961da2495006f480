use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use stockledger_core::{Entity, WarehouseId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_warehouse).get(list_warehouses))
        .route(
            "/:id",
            get(get_warehouse)
                .put(replace_warehouse)
                .patch(patch_warehouse)
                .delete(delete_warehouse),
        )
}

fn parse_id(path: Result<Path<String>, PathRejection>) -> Result<WarehouseId, axum::response::Response> {
    let Path(raw) = path.map_err(errors::rejection_to_response)?;
    raw.parse().map_err(errors::domain_error_to_response)
}

pub async fn create_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::WarehouseRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::rejection_to_response(e),
    };
    let input = match body.validate() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.create_warehouse(&input).await {
        Ok(w) => (
            StatusCode::CREATED,
            [(header::LOCATION, format!("/warehouses/{}", w.id()))],
            Json(dto::warehouse_to_json(&w)),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_warehouses(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::CatalogListQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::rejection_to_response(e),
    };
    let (filter, page) = match query.into_parts() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.list_warehouses(&filter, page).await {
        Ok(page) => Json(page.map(|w| dto::warehouse_to_json(&w))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<dto::IncludeDeletedQuery>, QueryRejection>,
) -> axum::response::Response {
    let id = match parse_id(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::rejection_to_response(e),
    };

    match services
        .catalog
        .get_warehouse(id, query.include_deleted.unwrap_or(false))
        .await
    {
        Ok(w) => Json(dto::warehouse_to_json(&w)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn replace_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<dto::WarehouseRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::rejection_to_response(e),
    };
    let input = match body.validate() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.replace_warehouse(id, &input).await {
        Ok(w) => Json(dto::warehouse_to_json(&w)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn patch_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<dto::WarehousePatchRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::rejection_to_response(e),
    };

    match services.catalog.patch_warehouse(id, &body.into()).await {
        Ok(w) => Json(dto::warehouse_to_json(&w)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<dto::DeleteQuery>, QueryRejection>,
) -> axum::response::Response {
    let id = match parse_id(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::rejection_to_response(e),
    };

    match services
        .catalog
        .delete_warehouse(id, query.hard.unwrap_or(false))
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
