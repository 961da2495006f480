//! `stockledger-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the error taxonomy, paging and the entity/value-object traits
//! shared by the catalog and inventory crates.

pub mod entity;
pub mod error;
pub mod id;
pub mod page;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{MovementId, ProductId, WarehouseId};
pub use page::{Page, PageRequest};
pub use value_object::{Quantity, ValueObject};
