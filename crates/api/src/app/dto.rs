use serde::Deserialize;
use serde_json::{json, Map, Value};

use stockledger_catalog::{NewProduct, NewWarehouse, Product, ProductPatch, Warehouse, WarehousePatch};
use stockledger_core::{DomainResult, PageRequest, ProductId, WarehouseId};
use stockledger_infra::catalog::CatalogQuery;
use stockledger_infra::ledger::InventoryFilter;
use stockledger_infra::movement_log::MovementFilter;
use stockledger_inventory::{MovementOutcome, MovementRequest, MovementType};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseRequest {
    pub name: String,
    pub code: String,
    pub address: Option<String>,
}

impl WarehouseRequest {
    pub fn validate(&self) -> DomainResult<NewWarehouse> {
        NewWarehouse::new(&self.name, &self.code, self.address.as_deref())
    }
}

/// Absent and `null` fields both keep the stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarehousePatchRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub address: Option<String>,
}

impl From<WarehousePatchRequest> for WarehousePatch {
    fn from(body: WarehousePatchRequest) -> Self {
        WarehousePatch {
            name: body.name,
            code: body.code,
            address: body.address,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductRequest {
    pub sku: String,
    pub name: String,
    pub unit: Option<String>,
    pub price: Option<f64>,
}

impl ProductRequest {
    pub fn validate(&self) -> DomainResult<NewProduct> {
        NewProduct::new(&self.sku, &self.name, self.unit.as_deref(), self.price)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductPatchRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub price: Option<f64>,
}

impl From<ProductPatchRequest> for ProductPatch {
    fn from(body: ProductPatchRequest) -> Self {
        ProductPatch {
            sku: body.sku,
            name: body.name,
            unit: body.unit,
            price: body.price,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StockMovementRequest {
    pub movement_type: MovementType,
    pub warehouse_id: i64,
    pub warehouse_to_id: Option<i64>,
    pub product_id: i64,
    pub qty: i64,
    pub reason: Option<String>,
    pub ref_no: Option<String>,
}

impl StockMovementRequest {
    pub fn into_domain(self) -> DomainResult<MovementRequest> {
        Ok(MovementRequest {
            movement_type: self.movement_type,
            warehouse_id: WarehouseId::parse(self.warehouse_id)?,
            warehouse_to_id: self.warehouse_to_id.map(WarehouseId::parse).transpose()?,
            product_id: ProductId::parse(self.product_id)?,
            qty: self.qty,
            reason: self.reason,
            ref_no: self.ref_no,
        })
    }
}

// -------------------------
// Query strings
// -------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogListQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub include_deleted: Option<bool>,
}

impl CatalogListQuery {
    pub fn into_parts(self) -> DomainResult<(CatalogQuery, PageRequest)> {
        let page = PageRequest::new(self.limit, self.offset)?;
        Ok((
            CatalogQuery {
                q: self.q,
                include_deleted: self.include_deleted.unwrap_or(false),
            },
            page,
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludeDeletedQuery {
    pub include_deleted: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    pub hard: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryListQuery {
    pub warehouse_id: Option<i64>,
    pub product_id: Option<i64>,
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl InventoryListQuery {
    pub fn into_parts(self) -> DomainResult<(InventoryFilter, PageRequest)> {
        let page = PageRequest::new(self.limit, self.offset)?;
        Ok((
            InventoryFilter {
                warehouse_id: self.warehouse_id.map(WarehouseId::parse).transpose()?,
                product_id: self.product_id.map(ProductId::parse).transpose()?,
                q: self.q,
            },
            page,
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementListQuery {
    pub warehouse_id: Option<i64>,
    pub product_id: Option<i64>,
    #[serde(rename = "type")]
    pub movement_type: Option<String>,
    #[serde(rename = "ref")]
    pub ref_no: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl MovementListQuery {
    pub fn into_parts(self) -> DomainResult<(MovementFilter, PageRequest)> {
        let page = PageRequest::new(self.limit, self.offset)?;
        Ok((
            MovementFilter {
                warehouse_id: self.warehouse_id.map(WarehouseId::parse).transpose()?,
                product_id: self.product_id.map(ProductId::parse).transpose()?,
                movement_type: self
                    .movement_type
                    .as_deref()
                    .map(|t| t.trim().to_ascii_uppercase().parse::<MovementType>())
                    .transpose()?,
                ref_no: self.ref_no,
            },
            page,
        ))
    }
}

// -------------------------
// Response mapping
// -------------------------

pub fn warehouse_to_json(w: &Warehouse) -> Value {
    json!({
        "id": w.id,
        "name": w.name,
        "code": w.code,
        "address": w.address,
        "created_at": w.created_at,
        "updated_at": w.updated_at,
        "deleted_at": w.lifecycle.deleted_at(),
    })
}

pub fn product_to_json(p: &Product) -> Value {
    json!({
        "id": p.id,
        "sku": p.sku,
        "name": p.name,
        "unit": p.unit,
        "price": p.price,
        "created_at": p.created_at,
        "updated_at": p.updated_at,
        "deleted_at": p.lifecycle.deleted_at(),
    })
}

/// Movement row plus post-commit quantities; destination fields only for transfers.
pub fn movement_outcome_to_json(outcome: &MovementOutcome) -> Value {
    let m = &outcome.movement;
    let mut body = Map::new();
    body.insert("id".into(), json!(m.id));
    body.insert("movement_type".into(), json!(m.movement_type));
    body.insert("warehouse_id".into(), json!(m.warehouse_id));
    if let Some(to) = m.warehouse_to_id {
        body.insert("warehouse_to_id".into(), json!(to));
    }
    body.insert("product_id".into(), json!(m.product_id));
    body.insert("qty".into(), json!(m.qty));
    body.insert("reason".into(), json!(m.reason));
    body.insert("ref_no".into(), json!(m.ref_no));
    body.insert("created_at".into(), json!(m.created_at));
    body.insert("after_qty_src".into(), json!(outcome.after_qty_src));
    if let Some(dst) = outcome.after_qty_dst {
        body.insert("after_qty_dst".into(), json!(dst));
    }
    Value::Object(body)
}
