use chrono::{DateTime, Utc};

use stockledger_core::{DomainError, DomainResult, Entity, WarehouseId};

use crate::lifecycle::Lifecycle;
use crate::text;

const NAME_MAX: usize = 100;
const CODE_MAX: usize = 50;
const ADDRESS_MAX: usize = 255;

/// A stock location. `code` is the business key, unique among live warehouses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub lifecycle: Lifecycle,
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Validated field set for a create or full replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWarehouse {
    name: String,
    code: String,
    address: Option<String>,
}

impl NewWarehouse {
    pub fn new(name: &str, code: &str, address: Option<&str>) -> DomainResult<Self> {
        Ok(Self {
            name: text::required("name", name, NAME_MAX)?,
            code: text::required("code", code, CODE_MAX)?,
            address: text::optional("address", address, ADDRESS_MAX)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

/// Partial update: absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarehousePatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub address: Option<String>,
}

impl WarehousePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.code.is_none() && self.address.is_none()
    }

    /// Merge onto `current` and validate the result as a full replacement.
    pub fn merge(&self, current: &Warehouse) -> DomainResult<NewWarehouse> {
        if self.is_empty() {
            return Err(DomainError::validation("patch must set at least one field"));
        }
        NewWarehouse::new(
            self.name.as_deref().unwrap_or(&current.name),
            self.code.as_deref().unwrap_or(&current.code),
            self.address.as_deref().or(current.address.as_deref()),
        )
    }
}
