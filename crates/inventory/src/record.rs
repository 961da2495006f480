use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, ProductId, WarehouseId};

/// Current quantity of one product in one warehouse.
///
/// A record that was never touched is equivalent to one holding zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub qty: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl InventoryRecord {
    pub fn empty(warehouse_id: WarehouseId, product_id: ProductId) -> Self {
        Self {
            warehouse_id,
            product_id,
            qty: 0,
            updated_at: None,
        }
    }

    /// Apply a signed delta; the record is left untouched if the result would be negative
    /// or would not fit in an `i64`.
    pub fn apply(&mut self, delta: i64) -> DomainResult<i64> {
        let next = self
            .qty
            .checked_add(delta)
            .ok_or_else(|| quantity_overflow(self.warehouse_id, self.product_id))?;
        if next < 0 {
            return Err(DomainError::InsufficientStock {
                warehouse_id: self.warehouse_id,
                product_id: self.product_id,
                available: self.qty,
                requested: -delta,
            });
        }
        self.qty = next;
        Ok(next)
    }
}

/// A credit that would push the quantity past `i64::MAX`.
pub fn quantity_overflow(warehouse_id: WarehouseId, product_id: ProductId) -> DomainError {
    DomainError::validation(format!(
        "quantity of product {product_id} in warehouse {warehouse_id} would exceed {}",
        i64::MAX
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overdraw_leaves_quantity_unchanged() {
        let mut r = InventoryRecord::empty(WarehouseId::new(1), ProductId::new(1));
        assert_eq!(r.apply(100).unwrap(), 100);
        assert_eq!(r.apply(-30).unwrap(), 70);

        let err = r.apply(-100).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                warehouse_id: WarehouseId::new(1),
                product_id: ProductId::new(1),
                available: 70,
                requested: 100,
            }
        );
        assert_eq!(r.qty, 70);
    }

    #[test]
    fn credit_past_i64_max_is_rejected() {
        let mut r = InventoryRecord::empty(WarehouseId::new(1), ProductId::new(1));
        r.apply(i64::MAX).unwrap();

        let err = r.apply(1).unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert_eq!(r.qty, i64::MAX);
    }
}
