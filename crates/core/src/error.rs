//! Domain error model.

use thiserror::Error;

use crate::id::{ProductId, WarehouseId};

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant maps to exactly one client-visible error kind (see [`DomainError::kind`]).
/// `Storage` is the only variant that carries infrastructure detail; it is logged by the
/// caller and never surfaced verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (missing/malformed field, non-positive quantity, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A movement request is structurally wrong for its type (e.g. a TRANSFER without a
    /// destination, or an IN carrying one).
    #[error("invalid movement: {0}")]
    InvalidMovement(String),

    /// A unique business key (warehouse code, product SKU) collides with a live row.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// An id does not resolve to a live row.
    #[error("{0} not found")]
    NotFound(String),

    /// A debit would drive the quantity of a ledger record below zero.
    #[error(
        "insufficient stock for product {product_id} in warehouse {warehouse_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        warehouse_id: WarehouseId,
        product_id: ProductId,
        available: i64,
        requested: i64,
    },

    /// The store could not grant the required locks within the bounded wait.
    ///
    /// Nothing was persisted; the request is safe to retry unmodified.
    #[error("store busy: {0}")]
    Busy(String),

    /// A hard delete was refused because stored rows still reference the target.
    #[error("still referenced: {0}")]
    Referenced(String),

    /// Opaque storage failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_movement(msg: impl Into<String>) -> Self {
        Self::InvalidMovement(msg.into())
    }

    pub fn duplicate_key(msg: impl Into<String>) -> Self {
        Self::DuplicateKey(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    pub fn referenced(msg: impl Into<String>) -> Self {
        Self::Referenced(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Stable, machine-readable error kind (snake_case).
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::InvalidMovement(_) => "invalid_movement",
            DomainError::DuplicateKey(_) => "duplicate_key",
            DomainError::NotFound(_) => "not_found",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
            DomainError::Busy(_) => "busy",
            DomainError::Referenced(_) => "referenced",
            DomainError::Storage(_) => "storage_error",
        }
    }

    /// Whether the caller may retry the same request unmodified.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Busy(_))
    }
}
