//! Catalog domain module: warehouses and products.
//!
//! Pure domain logic (no IO): entity shapes, the soft-delete lifecycle and the field
//! rules every create/update must satisfy before it reaches storage.

pub mod lifecycle;
pub mod product;
mod text;
pub mod warehouse;

pub use lifecycle::Lifecycle;
pub use product::{NewProduct, Product, ProductPatch, DEFAULT_UNIT};
pub use warehouse::{NewWarehouse, Warehouse, WarehousePatch};
