use chrono::{DateTime, Utc};

use stockledger_core::{DomainError, DomainResult, Entity, ProductId};

use crate::lifecycle::Lifecycle;
use crate::text;

/// Unit of measure used when none is given.
pub const DEFAULT_UNIT: &str = "pcs";

const SKU_MAX: usize = 100;
const NAME_MAX: usize = 200;
const UNIT_MAX: usize = 20;

/// A stocked item. `sku` is the business key, unique among live products.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub lifecycle: Lifecycle,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Validated field set for a create or full replace.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    sku: String,
    name: String,
    unit: String,
    price: Option<f64>,
}

impl NewProduct {
    /// `unit` defaults to [`DEFAULT_UNIT`]; `price`, when present, must be finite and >= 0.
    pub fn new(sku: &str, name: &str, unit: Option<&str>, price: Option<f64>) -> DomainResult<Self> {
        let unit = match unit {
            Some(u) => text::required("unit", u, UNIT_MAX)?,
            None => DEFAULT_UNIT.to_string(),
        };
        if let Some(p) = price {
            if !p.is_finite() || p < 0.0 {
                return Err(DomainError::validation(format!(
                    "price must be a non-negative number (got {p})"
                )));
            }
        }
        Ok(Self {
            sku: text::required("sku", sku, SKU_MAX)?,
            name: text::required("name", name, NAME_MAX)?,
            unit,
            price,
        })
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }
}

/// Partial update: absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub price: Option<f64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.sku.is_none() && self.name.is_none() && self.unit.is_none() && self.price.is_none()
    }

    /// Merge onto `current` and validate the result as a full replacement.
    pub fn merge(&self, current: &Product) -> DomainResult<NewProduct> {
        if self.is_empty() {
            return Err(DomainError::validation("patch must set at least one field"));
        }
        NewProduct::new(
            self.sku.as_deref().unwrap_or(&current.sku),
            self.name.as_deref().unwrap_or(&current.name),
            Some(self.unit.as_deref().unwrap_or(&current.unit)),
            self.price.or(current.price),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn existing() -> Product {
        Product {
            id: ProductId::new(4),
            sku: "SKU-4".to_string(),
            name: "Bolt".to_string(),
            unit: "box".to_string(),
            price: Some(2.5),
            created_at: Utc::now(),
            updated_at: None,
            lifecycle: Lifecycle::Active,
        }
    }

    #[test]
    fn unit_defaults_to_pcs() {
        let p = NewProduct::new("SKU-1", "Widget", None, None).unwrap();
        assert_eq!(p.unit(), "pcs");
        assert_eq!(p.price(), None);
    }

    #[test]
    fn negative_or_nan_price_is_rejected() {
        assert!(NewProduct::new("SKU-1", "Widget", None, Some(-0.01)).is_err());
        assert!(NewProduct::new("SKU-1", "Widget", None, Some(f64::NAN)).is_err());
        assert!(NewProduct::new("SKU-1", "Widget", None, Some(0.0)).is_ok());
    }

    #[test]
    fn patch_changes_only_given_fields() {
        let patch = ProductPatch {
            price: Some(3.0),
            ..ProductPatch::default()
        };
        let merged = patch.merge(&existing()).unwrap();
        assert_eq!(merged.sku(), "SKU-4");
        assert_eq!(merged.unit(), "box");
        assert_eq!(merged.price(), Some(3.0));
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(matches!(
            ProductPatch::default().merge(&existing()),
            Err(DomainError::Validation(_))
        ));
    }

    proptest! {
        #[test]
        fn sku_is_trimmed(core in "[A-Z0-9-]{1,40}", pad in 0usize..5) {
            let padded = format!("{}{}{}", " ".repeat(pad), core, " ".repeat(pad));
            let p = NewProduct::new(&padded, "Widget", None, None).unwrap();
            prop_assert_eq!(p.sku(), core.as_str());
        }
    }
}
