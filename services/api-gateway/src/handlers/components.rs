//! BOM Handlers
//!
//! HTTP surface of the BOM engine: edge mutations, listings and the
//! rolled-up cost of a product.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use meridian_models::ComponentEdge;
use meridian_utils::bom::BomResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::change_context;
use crate::metrics::record_bom_operation;
use crate::middleware::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddComponentRequest {
    pub component_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CostResponse {
    pub product_id: Uuid,
    pub rolled_up_cost: Decimal,
    pub scale: u32,
}

#[derive(Debug, Serialize)]
pub struct DependentsResponse {
    pub product_id: Uuid,
    pub has_dependent_edges: bool,
}

fn tracked<T>(operation: &str, result: BomResult<T>) -> BomResult<T> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.error_code(),
    };
    record_bom_operation(operation, outcome);
    result
}

/// POST /api/v1/products/:id/components
pub async fn add_component(
    State(state): State<AppState>,
    Path(parent_id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<AddComponentRequest>,
) -> ApiResult<(StatusCode, Json<ComponentEdge>)> {
    let ctx = change_context(&headers)?;
    let edge = tracked(
        "add_component",
        state
            .bom
            .add_component(parent_id, request.component_id, request.quantity, &ctx)
            .await,
    )?;
    Ok((StatusCode::CREATED, Json(edge)))
}

/// GET /api/v1/products/:id/components
pub async fn list_components(
    State(state): State<AppState>,
    Path(parent_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ComponentEdge>>> {
    Ok(Json(state.bom.components_of(parent_id).await?))
}

/// PUT /api/v1/products/:id/components/:component_id
pub async fn update_component_quantity(
    State(state): State<AppState>,
    Path((parent_id, component_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    Json(request): Json<UpdateQuantityRequest>,
) -> ApiResult<Json<ComponentEdge>> {
    let ctx = change_context(&headers)?;
    let edge = tracked(
        "update_quantity",
        state
            .bom
            .update_quantity(parent_id, component_id, request.quantity, &ctx)
            .await,
    )?;
    Ok(Json(edge))
}

/// DELETE /api/v1/products/:id/components/:component_id
pub async fn remove_component(
    State(state): State<AppState>,
    Path((parent_id, component_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let ctx = change_context(&headers)?;
    tracked(
        "remove_component",
        state.bom.remove_component(parent_id, component_id, &ctx).await,
    )?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/products/:id/cost
pub async fn get_rolled_up_cost(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<CostResponse>> {
    let result = state.bom.rolled_up_cost(product_id).await;
    if matches!(&result, Err(e) if e.is_integrity_violation()) {
        record_bom_operation("rolled_up_cost", "integrity_violation");
    }
    Ok(Json(CostResponse {
        product_id,
        rolled_up_cost: result?,
        scale: state.bom.config().cost_scale,
    }))
}

/// GET /api/v1/products/:id/where-used
pub async fn where_used(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ComponentEdge>>> {
    Ok(Json(state.bom.where_used(product_id).await?))
}

/// GET /api/v1/products/:id/dependents
pub async fn dependents(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<DependentsResponse>> {
    let has_dependent_edges = state.bom.has_dependent_edges(product_id).await?;
    Ok(Json(DependentsResponse {
        product_id,
        has_dependent_edges,
    }))
}
