//! Product Handlers
//!
//! Catalog CRUD. Direct cost changes go through the BOM service so the
//! cost and the invalidation of dependent assemblies commit together.
//! Deletion is refused while the product is used in a BOM.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use meridian_database::{DeleteOutcome, ProductRepository};
use meridian_models::{Product, ProductKind};
use meridian_utils::MeridianError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::change_context;
use crate::middleware::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub part_number: String,
    pub name: String,
    pub kind: ProductKind,
    pub direct_cost: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDirectCostRequest {
    pub direct_cost: Decimal,
}

#[derive(Debug, Serialize)]
pub struct DirectCostResponse {
    pub product_id: Uuid,
    pub direct_cost: Decimal,
    /// Products whose cached rolled-up cost was cleared
    pub invalidated: usize,
}

/// GET /api/v1/products
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    let repository = ProductRepository::new(state.postgres_pool.clone());
    Ok(Json(repository.find_all().await?))
}

/// GET /api/v1/products/:id
pub async fn get_product(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Product>> {
    let repository = ProductRepository::new(state.postgres_pool.clone());
    let product = repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| MeridianError::not_found(format!("product {}", id)))?;
    Ok(Json(product))
}

/// POST /api/v1/products
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = match (request.kind, request.direct_cost) {
        (ProductKind::Leaf, Some(direct_cost)) => Product::leaf(request.part_number, request.name, direct_cost),
        (ProductKind::Composite, None) => Product::composite(request.part_number, request.name),
        (ProductKind::Leaf, None) => {
            return Err(MeridianError::validation("direct_cost", "leaf products require a direct cost").into())
        }
        (ProductKind::Composite, Some(_)) => {
            return Err(MeridianError::validation(
                "direct_cost",
                "composite products take their cost from their BOM",
            )
            .into())
        }
    };

    let repository = ProductRepository::new(state.postgres_pool.clone());

    if repository.find_by_part_number(&product.part_number).await?.is_some() {
        return Err(MeridianError::conflict(format!(
            "part number '{}' already exists",
            product.part_number
        ))
        .into());
    }

    let product = repository.create(product).await?;
    info!(product_id = %product.id, part_number = %product.part_number, kind = %product.kind, "Created product");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/v1/products/:id/direct-cost
pub async fn update_direct_cost(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<UpdateDirectCostRequest>,
) -> ApiResult<Json<DirectCostResponse>> {
    let ctx = change_context(&headers)?;
    let invalidated = state.bom.set_direct_cost(id, request.direct_cost, &ctx).await?;

    Ok(Json(DirectCostResponse {
        product_id: id,
        direct_cost: request.direct_cost,
        invalidated,
    }))
}

/// DELETE /api/v1/products/:id
pub async fn delete_product(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    let repository = ProductRepository::new(state.postgres_pool.clone());

    match repository.delete(id).await? {
        DeleteOutcome::Deleted => {
            info!(product_id = %id, "Deleted product");
            Ok(StatusCode::NO_CONTENT)
        }
        DeleteOutcome::NotFound => Err(MeridianError::not_found(format!("product {}", id)).into()),
        DeleteOutcome::HasDependents => Err(MeridianError::conflict(format!(
            "product {} is still used in a bill of materials",
            id
        ))
        .into()),
    }
}
