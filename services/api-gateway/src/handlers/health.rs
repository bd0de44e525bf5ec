use axum::{extract::State, response::Json};
use meridian_database::postgres_health_check;
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "meridian-api-gateway",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn detailed_health_check(State(state): State<AppState>) -> Json<Value> {
    let postgres = match postgres_health_check(&state.postgres_pool).await {
        Ok(_) => json!({"status": "healthy", "message": "Connected"}),
        Err(e) => json!({"status": "unhealthy", "message": e.to_string()}),
    };

    // Acyclicity of the stored BOM graph
    let bom_graph = match state.bom.verify_integrity().await {
        Ok(edges) => json!({"status": "healthy", "message": format!("{} edges, acyclic", edges)}),
        Err(e) => json!({"status": "unhealthy", "message": e.to_string()}),
    };

    let all_healthy = postgres["status"] == "healthy" && bom_graph["status"] == "healthy";

    Json(json!({
        "status": if all_healthy { "healthy" } else { "degraded" },
        "service": "meridian-api-gateway",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "postgres": postgres,
            "bom_graph": bom_graph,
        }
    }))
}
