//! Component Edge Repository
//!
//! Every query takes a connection so it joins the transaction that holds
//! the BOM graph lock. Nothing outside `PgBomStore` should call these.

use anyhow::{Context, Result};
use sqlx::PgConnection;
use uuid::Uuid;

use meridian_models::ComponentEdge;

const EDGE_COLUMNS: &str =
    "parent_id, component_id, quantity, created_by, created_at, updated_by, updated_at";

pub async fn load_all(conn: &mut PgConnection) -> Result<Vec<ComponentEdge>> {
    sqlx::query_as(&format!("SELECT {} FROM component_edges", EDGE_COLUMNS))
        .fetch_all(conn)
        .await
        .context("Failed to load BOM edges")
}

pub async fn insert(conn: &mut PgConnection, edge: &ComponentEdge) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO component_edges
            (parent_id, component_id, quantity, created_by, created_at, updated_by, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(edge.parent_id)
    .bind(edge.component_id)
    .bind(edge.quantity)
    .bind(&edge.created_by)
    .bind(edge.created_at)
    .bind(&edge.updated_by)
    .bind(edge.updated_at)
    .execute(conn)
    .await
    .context("Failed to insert BOM edge")?;

    Ok(())
}

pub async fn update_quantity(conn: &mut PgConnection, edge: &ComponentEdge) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE component_edges SET
            quantity = $3,
            updated_by = $4,
            updated_at = $5
        WHERE parent_id = $1 AND component_id = $2
        "#,
    )
    .bind(edge.parent_id)
    .bind(edge.component_id)
    .bind(edge.quantity)
    .bind(&edge.updated_by)
    .bind(edge.updated_at)
    .execute(conn)
    .await
    .context("Failed to update BOM edge")?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(conn: &mut PgConnection, parent_id: Uuid, component_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM component_edges WHERE parent_id = $1 AND component_id = $2")
        .bind(parent_id)
        .bind(component_id)
        .execute(conn)
        .await
        .context("Failed to delete BOM edge")?;

    Ok(result.rows_affected() > 0)
}
