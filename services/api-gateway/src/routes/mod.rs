use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers::*, AppState};

pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .route("/health/detailed", get(detailed_health_check))
        .nest("/products", product_routes())
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).delete(delete_product))
        .route("/:id/direct-cost", put(update_direct_cost))
        .route("/:id/components", post(add_component).get(list_components))
        .route(
            "/:id/components/:component_id",
            put(update_component_quantity).delete(remove_component),
        )
        .route("/:id/cost", get(get_rolled_up_cost))
        .route("/:id/where-used", get(where_used))
        .route("/:id/dependents", get(dependents))
}
