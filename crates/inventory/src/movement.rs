use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, Entity, MovementId, ProductId, Quantity, WarehouseId};

/// Maximum length of the free-text movement reason.
pub const REASON_MAX: usize = 255;
/// Maximum length of the external reference string.
pub const REF_NO_MAX: usize = 100;

/// Kind of stock-changing event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    /// Receipt into a warehouse.
    In,
    /// Shipment out of a warehouse.
    Out,
    /// Move between two warehouses.
    Transfer,
    /// Stock-count correction.
    ///
    /// **Increase-only.** An ADJUST always credits its warehouse; a downward correction
    /// must be booked as `Out`. Signed adjustments are deliberately not supported.
    Adjust,
}

impl MovementType {
    pub const ALL: [MovementType; 4] = [
        MovementType::In,
        MovementType::Out,
        MovementType::Transfer,
        MovementType::Adjust,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
            MovementType::Transfer => "TRANSFER",
            MovementType::Adjust => "ADJUST",
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MovementType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "movement_type must be one of IN, OUT, TRANSFER, ADJUST (got {s:?})"
                ))
            })
    }
}

/// Untrusted movement request, as received from the boundary layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRequest {
    pub movement_type: MovementType,
    pub warehouse_id: WarehouseId,
    pub warehouse_to_id: Option<WarehouseId>,
    pub product_id: ProductId,
    pub qty: i64,
    pub reason: Option<String>,
    pub ref_no: Option<String>,
}

impl MovementRequest {
    /// Check the type-specific shape rules. No storage is consulted.
    pub fn validate(self) -> DomainResult<ValidatedMovement> {
        let qty = Quantity::new(self.qty)?;
        check_len("reason", self.reason.as_deref(), REASON_MAX)?;
        check_len("ref_no", self.ref_no.as_deref(), REF_NO_MAX)?;

        match (self.movement_type, self.warehouse_to_id) {
            (MovementType::Transfer, None) => {
                return Err(DomainError::invalid_movement(
                    "warehouse_to_id required for TRANSFER",
                ));
            }
            (MovementType::Transfer, Some(to)) if to == self.warehouse_id => {
                return Err(DomainError::invalid_movement(
                    "cannot transfer to the same warehouse",
                ));
            }
            (t, Some(_)) if t != MovementType::Transfer => {
                return Err(DomainError::invalid_movement(format!(
                    "warehouse_to_id only allowed for TRANSFER (got {t})"
                )));
            }
            _ => {}
        }

        Ok(ValidatedMovement {
            movement_type: self.movement_type,
            warehouse_id: self.warehouse_id,
            warehouse_to_id: self.warehouse_to_id,
            product_id: self.product_id,
            qty,
            reason: self.reason,
            ref_no: self.ref_no,
        })
    }
}

fn check_len(field: &str, value: Option<&str>, max: usize) -> DomainResult<()> {
    if let Some(v) = value {
        let len = v.chars().count();
        if len > max {
            return Err(DomainError::validation(format!(
                "{field} must be at most {max} characters (got {len})"
            )));
        }
    }
    Ok(())
}

/// One signed ledger change produced by a movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Posting {
    pub warehouse_id: WarehouseId,
    pub delta: i64,
}

/// The postings of one movement. Only a TRANSFER has a destination side.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Postings {
    pub source: Posting,
    pub destination: Option<Posting>,
}

impl Postings {
    /// Postings in the order they must be applied.
    pub fn iter(&self) -> impl Iterator<Item = Posting> {
        core::iter::once(self.source).chain(self.destination)
    }
}

/// A movement that passed shape validation and may be handed to the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMovement {
    movement_type: MovementType,
    warehouse_id: WarehouseId,
    warehouse_to_id: Option<WarehouseId>,
    product_id: ProductId,
    qty: Quantity,
    reason: Option<String>,
    ref_no: Option<String>,
}

impl ValidatedMovement {
    pub fn movement_type(&self) -> MovementType {
        self.movement_type
    }

    pub fn warehouse_id(&self) -> WarehouseId {
        self.warehouse_id
    }

    pub fn warehouse_to_id(&self) -> Option<WarehouseId> {
        self.warehouse_to_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn qty(&self) -> Quantity {
        self.qty
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn ref_no(&self) -> Option<&str> {
        self.ref_no.as_deref()
    }

    /// Every warehouse the movement touches, source first.
    pub fn warehouses(&self) -> impl Iterator<Item = WarehouseId> + '_ {
        core::iter::once(self.warehouse_id).chain(self.warehouse_to_id)
    }

    /// Ledger postings of this movement.
    ///
    /// For TRANSFER the source side is the debit, so a failed debit aborts before the
    /// credit is posted.
    pub fn postings(&self) -> Postings {
        let q = self.qty.get();
        let source_delta = match self.movement_type {
            MovementType::In | MovementType::Adjust => q,
            MovementType::Out | MovementType::Transfer => -q,
        };
        Postings {
            source: Posting {
                warehouse_id: self.warehouse_id,
                delta: source_delta,
            },
            destination: self.warehouse_to_id.map(|to| Posting {
                warehouse_id: to,
                delta: q,
            }),
        }
    }
}

/// A committed, immutable row of the movement log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub movement_type: MovementType,
    pub warehouse_id: WarehouseId,
    pub warehouse_to_id: Option<WarehouseId>,
    pub product_id: ProductId,
    pub qty: Quantity,
    pub reason: Option<String>,
    pub ref_no: Option<String>,
    pub created_at: DateTime<Utc>,
    pub src_qty_before: i64,
    pub src_qty_after: i64,
    pub dst_qty_before: Option<i64>,
    pub dst_qty_after: Option<i64>,
}

impl Entity for StockMovement {
    type Id = MovementId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Result of a committed movement: the log row plus post-commit ledger quantities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementOutcome {
    pub movement: StockMovement,
    pub after_qty_src: i64,
    pub after_qty_dst: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(t: MovementType, to: Option<i64>, qty: i64) -> MovementRequest {
        MovementRequest {
            movement_type: t,
            warehouse_id: WarehouseId::new(1),
            warehouse_to_id: to.map(WarehouseId::new),
            product_id: ProductId::new(10),
            qty,
            reason: None,
            ref_no: None,
        }
    }

    #[test]
    fn non_positive_qty_is_a_validation_error() {
        for qty in [0, -5] {
            let err = request(MovementType::In, None, qty).validate().unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
    }

    #[test]
    fn transfer_requires_distinct_destination() {
        let missing = request(MovementType::Transfer, None, 1).validate().unwrap_err();
        assert!(matches!(missing, DomainError::InvalidMovement(_)));

        let same = request(MovementType::Transfer, Some(1), 1).validate().unwrap_err();
        assert!(matches!(same, DomainError::InvalidMovement(_)));
    }

    #[test]
    fn destination_is_rejected_for_non_transfers() {
        for t in [MovementType::In, MovementType::Out, MovementType::Adjust] {
            let err = request(t, Some(2), 1).validate().unwrap_err();
            assert!(matches!(err, DomainError::InvalidMovement(_)), "{t}");
        }
    }

    #[test]
    fn overlong_ref_no_is_rejected() {
        let mut req = request(MovementType::In, None, 1);
        req.ref_no = Some("r".repeat(REF_NO_MAX + 1));
        assert!(matches!(req.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn postings_follow_movement_semantics() {
        let p = |t, to| request(t, to, 5).validate().unwrap().postings();
        let w = |id, delta| Posting { warehouse_id: WarehouseId::new(id), delta };

        assert_eq!(p(MovementType::In, None), Postings { source: w(1, 5), destination: None });
        assert_eq!(p(MovementType::Out, None), Postings { source: w(1, -5), destination: None });
        assert_eq!(p(MovementType::Adjust, None), Postings { source: w(1, 5), destination: None });
        assert_eq!(
            p(MovementType::Transfer, Some(2)),
            Postings { source: w(1, -5), destination: Some(w(2, 5)) }
        );
    }

    #[test]
    fn only_transfers_post_a_destination_side() {
        for t in MovementType::ALL {
            let to = (t == MovementType::Transfer).then_some(2);
            let postings = request(t, to, 3).validate().unwrap().postings();

            assert_eq!(postings.source.warehouse_id, WarehouseId::new(1), "{t}");
            assert_eq!(postings.destination.is_some(), to.is_some(), "{t}");
            assert_eq!(postings.iter().count(), if to.is_some() { 2 } else { 1 }, "{t}");
        }
    }

    #[test]
    fn warehouses_lists_source_then_destination() {
        let m = request(MovementType::Transfer, Some(2), 1).validate().unwrap();
        let ids: Vec<_> = m.warehouses().collect();
        assert_eq!(ids, vec![WarehouseId::new(1), WarehouseId::new(2)]);
    }

    #[test]
    fn movement_type_wire_names() {
        assert_eq!(serde_json::to_string(&MovementType::Transfer).unwrap(), "\"TRANSFER\"");
        assert_eq!("ADJUST".parse::<MovementType>().unwrap(), MovementType::Adjust);
        assert!("adjust".parse::<MovementType>().is_err());
    }
}
