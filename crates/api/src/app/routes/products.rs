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

use stockledger_core::{Entity, ProductId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route(
            "/:id",
            get(get_product)
                .put(replace_product)
                .patch(patch_product)
                .delete(delete_product),
        )
}

fn parse_id(path: Result<Path<String>, PathRejection>) -> Result<ProductId, axum::response::Response> {
    let Path(raw) = path.map_err(errors::rejection_to_response)?;
    raw.parse().map_err(errors::domain_error_to_response)
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::ProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::rejection_to_response(e),
    };
    let input = match body.validate() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.create_product(&input).await {
        Ok(p) => (
            StatusCode::CREATED,
            [(header::LOCATION, format!("/products/{}", p.id()))],
            Json(dto::product_to_json(&p)),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_products(
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

    match services.catalog.list_products(&filter, page).await {
        Ok(page) => Json(page.map(|p| dto::product_to_json(&p))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_product(
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
        .get_product(id, query.include_deleted.unwrap_or(false))
        .await
    {
        Ok(p) => Json(dto::product_to_json(&p)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn replace_product(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<dto::ProductRequest>, JsonRejection>,
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

    match services.catalog.replace_product(id, &input).await {
        Ok(p) => Json(dto::product_to_json(&p)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn patch_product(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<dto::ProductPatchRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::rejection_to_response(e),
    };

    match services.catalog.patch_product(id, &body.into()).await {
        Ok(p) => Json(dto::product_to_json(&p)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_product(
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
        .delete_product(id, query.hard.unwrap_or(false))
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
