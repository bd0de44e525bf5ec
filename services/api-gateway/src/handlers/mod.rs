pub mod components;
pub mod health;
pub mod products;

pub use components::*;
pub use health::*;
pub use products::*;

use axum::http::HeaderMap;
use meridian_models::ChangeContext;
use meridian_utils::MeridianError;

pub const ACTOR_HEADER: &str = "x-actor";

/// Builds the audit context of a mutation from the `x-actor` header
pub fn change_context(headers: &HeaderMap) -> Result<ChangeContext, MeridianError> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|actor| !actor.is_empty())
        .map(ChangeContext::new)
        .ok_or_else(|| MeridianError::validation(ACTOR_HEADER, "header is required for BOM changes"))
}
