//! Product Repository
//!
//! CRUD operations for catalog products. Deletion refuses products that
//! still take part in a BOM.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use meridian_models::{Product, ProductKind};
use meridian_utils::bom::ProductFacts;
use meridian_utils::validate_model;

use crate::bom_store::lock_bom_graph;

const PRODUCT_COLUMNS: &str =
    "id, part_number, name, kind, direct_cost, rolled_up_cost, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// The product is a parent or a component of at least one BOM line
    HasDependents,
}

pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find product by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch product by ID")?;

        row.map(Product::try_from).transpose()
    }

    pub async fn find_by_part_number(&self, part_number: &str) -> Result<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE part_number = $1",
            PRODUCT_COLUMNS
        ))
        .bind(part_number)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch product by part number")?;

        row.map(Product::try_from).transpose()
    }

    /// Find all products
    pub async fn find_all(&self) -> Result<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products ORDER BY part_number",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch all products")?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Create new product
    pub async fn create(&self, product: Product) -> Result<Product> {
        validate_model(&product)?;
        let now = Utc::now();

        let row: ProductRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO products
                (id, part_number, name, kind, direct_cost, rolled_up_cost, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NULL, $6, $7)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(product.id)
        .bind(&product.part_number)
        .bind(&product.name)
        .bind(product.kind.as_str())
        .bind(product.direct_cost)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create product")?;

        row.try_into()
    }

    /// Delete product, unless a BOM still references it
    pub async fn delete(&self, id: Uuid) -> Result<DeleteOutcome> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        // Serialize with BOM mutations so no edge can appear mid-delete
        lock_bom_graph(&mut *tx).await?;

        let (has_dependents,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM component_edges
                WHERE parent_id = $1 OR component_id = $1
            )
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to check product dependents")?;

        if has_dependents {
            return Ok(DeleteOutcome::HasDependents);
        }

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete product")?;
        tx.commit().await.context("Failed to commit product deletion")?;

        if result.rows_affected() > 0 {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    id: Uuid,
    part_number: String,
    name: String,
    kind: String,
    direct_cost: Option<Decimal>,
    rolled_up_cost: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub(crate) fn parse_kind(kind: &str) -> Result<ProductKind> {
    ProductKind::parse(kind).ok_or_else(|| anyhow!("unknown product kind '{}'", kind))
}

impl TryFrom<ProductRow> for Product {
    type Error = anyhow::Error;

    fn try_from(row: ProductRow) -> Result<Self> {
        Ok(Product {
            id: row.id,
            part_number: row.part_number,
            name: row.name,
            kind: parse_kind(&row.kind)?,
            direct_cost: row.direct_cost,
            rolled_up_cost: row.rolled_up_cost,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// The subset of a product row the BOM engine reads
#[derive(Debug, FromRow)]
pub(crate) struct ProductFactsRow {
    pub(crate) id: Uuid,
    kind: String,
    direct_cost: Option<Decimal>,
    rolled_up_cost: Option<Decimal>,
}

impl TryFrom<ProductFactsRow> for ProductFacts {
    type Error = anyhow::Error;

    fn try_from(row: ProductFactsRow) -> Result<Self> {
        Ok(ProductFacts {
            kind: parse_kind(&row.kind)?,
            direct_cost: row.direct_cost,
            rolled_up_cost: row.rolled_up_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: &str) -> ProductRow {
        let now = Utc::now();
        ProductRow {
            id: Uuid::new_v4(),
            part_number: "AS-100".to_string(),
            name: "Gearbox".to_string(),
            kind: kind.to_string(),
            direct_cost: None,
            rolled_up_cost: Some(Decimal::new(1250, 2)),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_maps_to_product() {
        let product = Product::try_from(row("composite")).unwrap();
        assert_eq!(product.kind, ProductKind::Composite);
        assert_eq!(product.rolled_up_cost, Some(Decimal::new(1250, 2)));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = Product::try_from(row("assembly")).unwrap_err();
        assert!(err.to_string().contains("assembly"));
    }

    #[test]
    fn test_facts_row_mapping() {
        let facts = ProductFacts::try_from(ProductFactsRow {
            id: Uuid::new_v4(),
            kind: "leaf".to_string(),
            direct_cost: Some(Decimal::TEN),
            rolled_up_cost: None,
        })
        .unwrap();
        assert_eq!(facts, ProductFacts::leaf(Decimal::TEN));
    }
}
