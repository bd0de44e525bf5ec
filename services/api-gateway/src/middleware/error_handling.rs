use axum::{
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use meridian_utils::{bom::BomError, ErrorResponse, MeridianError};
use serde_json::json;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Handler error rendered as the shared `ErrorResponse` body
#[derive(Debug)]
pub struct ApiError {
    error: MeridianError,
    details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<MeridianError> for ApiError {
    fn from(error: MeridianError) -> Self {
        Self { error, details: None }
    }
}

impl From<BomError> for ApiError {
    fn from(error: BomError) -> Self {
        let details = json!({ "bom_error": error.error_code() });
        Self {
            error: error.into(),
            details: Some(details),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        // Validation failures surfaced through a repository keep their kind
        match error.downcast::<MeridianError>() {
            Ok(error) => error.into(),
            Err(error) => MeridianError::database(format!("{:#}", error)).into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = ErrorResponse::from(self.error);
        body.details = self.details;
        (status, Json(body)).into_response()
    }
}

pub async fn error_handling_middleware(request: Request<axum::body::Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    if response.status().is_server_error() {
        error!(%method, %path, status = response.status().as_u16(), "Request failed");
    }

    response
}
