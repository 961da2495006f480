use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query,
    },
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use stockledger_infra::movement_log;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", post(create_movement).get(list_movements))
}

pub async fn create_movement(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::StockMovementRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::rejection_to_response(e),
    };
    let request = match body.into_domain() {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.processor.process(request).await {
        Ok(outcome) => Json(dto::movement_outcome_to_json(&outcome)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::MovementListQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::rejection_to_response(e),
    };
    let (filter, page) = match query.into_parts() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match movement_log::list(services.pool(), &filter, page).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
