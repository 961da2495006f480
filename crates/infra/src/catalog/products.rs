use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite};
use tracing::instrument;

use stockledger_catalog::{Lifecycle, NewProduct, Product, ProductPatch};
use stockledger_core::{DomainError, DomainResult, Page, PageRequest, ProductId};

use super::{map_hard_delete_error, map_write_error, CatalogQuery, CatalogStore};
use crate::error::map_sqlx_error;

struct ProductRow(Product);

impl<'r> FromRow<'r, SqliteRow> for ProductRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let deleted_at: Option<DateTime<Utc>> = row.try_get("deleted_at")?;
        Ok(ProductRow(Product {
            id: ProductId::new(row.try_get("id")?),
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            unit: row.try_get("unit")?,
            price: row.try_get("price")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            lifecycle: Lifecycle::from_deleted_at(deleted_at),
        }))
    }
}

const SELECT: &str = "SELECT id, sku, name, unit, price, created_at, updated_at, deleted_at FROM products";
const RETURNING: &str = " RETURNING id, sku, name, unit, price, created_at, updated_at, deleted_at";

impl CatalogStore {
    #[instrument(skip(self, input), fields(sku = input.sku()), err)]
    pub async fn create_product(&self, input: &NewProduct) -> DomainResult<Product> {
        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO products (sku, name, unit, price, created_at) VALUES (?, ?, ?, ?, ?){RETURNING}"
        ))
        .bind(input.sku())
        .bind(input.name())
        .bind(input.unit())
        .bind(input.price())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error("create_product", "product SKU", input.sku(), e))?;

        tracing::info!(product_id = %row.0.id, "product created");
        Ok(row.0)
    }

    pub async fn get_product(&self, id: ProductId, include_deleted: bool) -> DomainResult<Product> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT);
        qb.push(" WHERE id = ").push_bind(id.get());
        if !include_deleted {
            qb.push(" AND deleted_at IS NULL");
        }
        qb.build_query_as::<ProductRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?
            .map(|row| row.0)
            .ok_or_else(|| DomainError::not_found(format!("product {id}")))
    }

    #[instrument(skip(self), err)]
    pub async fn list_products(&self, query: &CatalogQuery, page: PageRequest) -> DomainResult<Page<Product>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products");
        query.push_where(&mut count, "sku");
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_products", e))?;

        let mut items = QueryBuilder::<Sqlite>::new(SELECT);
        query.push_where(&mut items, "sku");
        items
            .push(" ORDER BY id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = items
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        Ok(Page::new(page, total, rows.into_iter().map(|r| r.0).collect()))
    }

    #[instrument(skip(self, input), err)]
    pub async fn replace_product(&self, id: ProductId, input: &NewProduct) -> DomainResult<Product> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE products SET sku = ?, name = ?, unit = ?, price = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL{RETURNING}"
        ))
        .bind(input.sku())
        .bind(input.name())
        .bind(input.unit())
        .bind(input.price())
        .bind(Utc::now())
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error("replace_product", "product SKU", input.sku(), e))?;

        row.map(|r| r.0)
            .ok_or_else(|| DomainError::not_found(format!("product {id}")))
    }

    pub async fn patch_product(&self, id: ProductId, patch: &ProductPatch) -> DomainResult<Product> {
        if patch.is_empty() {
            return Err(DomainError::validation("patch must set at least one field"));
        }
        let current = self.get_product(id, false).await?;
        let merged = patch.merge(&current)?;
        self.replace_product(id, &merged).await
    }

    #[instrument(skip(self), err)]
    pub async fn delete_product(&self, id: ProductId, hard: bool) -> DomainResult<()> {
        let result = if hard {
            tracing::warn!(product_id = %id, "hard delete requested");
            sqlx::query("DELETE FROM products WHERE id = ?")
                .bind(id.get())
                .execute(&self.pool)
                .await
                .map_err(|e| map_hard_delete_error("product", id.get(), e))?
        } else {
            sqlx::query("UPDATE products SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
                .bind(Utc::now())
                .bind(id.get())
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("delete_product", e))?
        };

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("product {id}")));
        }
        Ok(())
    }
}
