//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one, build a new
/// one. Construction is the only place where their invariants are checked.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// A strictly positive number of stock units moved by a single movement.
///
/// Direction (debit/credit) is never encoded in the quantity itself; it is derived from
/// the movement type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(i64);

impl Quantity {
    pub fn new(units: i64) -> DomainResult<Self> {
        if units <= 0 {
            return Err(DomainError::validation(format!(
                "qty must be a positive integer (got {units})"
            )));
        }
        Ok(Self(units))
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl ValueObject for Quantity {}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_is_not_a_quantity() {
        assert!(matches!(Quantity::new(0), Err(DomainError::Validation(_))));
    }

    #[test]
    fn deserialization_enforces_positivity() {
        assert!(serde_json::from_str::<Quantity>("-4").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("4").unwrap().get(), 4);
    }

    proptest! {
        #[test]
        fn accepts_exactly_the_positive_integers(n in any::<i64>()) {
            prop_assert_eq!(Quantity::new(n).is_ok(), n > 0);
        }
    }
}
