use axum::Router;

pub mod inventory;
pub mod products;
pub mod stock_movements;
pub mod system;
pub mod warehouses;

/// Router for all resource endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/warehouses", warehouses::router())
        .nest("/products", products::router())
        .nest("/inventory", inventory::router())
        .nest("/stock-movements", stock_movements::router())
}
