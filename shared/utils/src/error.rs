use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bom::BomError;

#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MeridianError {
    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("BOM cycle rejected: {message}")]
    BomCycle { message: String },

    #[error("Data integrity violation: {message}")]
    Integrity { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl MeridianError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::BomCycle { .. } => "BOM_CYCLE",
            Self::Integrity { .. } => "DATA_INTEGRITY_ERROR",
            Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Database { .. } => 500,
            Self::Validation { .. } => 400,
            Self::Configuration { .. } => 500,
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::BomCycle { .. } => 409,
            Self::Integrity { .. } => 500,
            Self::Internal { .. } => 500,
        }
    }
}

pub type MeridianResult<T> = Result<T, MeridianError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<MeridianError> for ErrorResponse {
    fn from(error: MeridianError) -> Self {
        Self {
            error: error.error_code().to_string(),
            code: error.error_code().to_string(),
            message: error.to_string(),
            details: None,
        }
    }
}

impl From<BomError> for MeridianError {
    fn from(error: BomError) -> Self {
        let message = error.to_string();
        match error {
            BomError::InvalidQuantity { .. } => Self::validation("quantity", message),
            BomError::NotComposite { .. } => Self::validation("parent_id", message),
            BomError::UnknownComponent { .. } => Self::validation("component_id", message),
            BomError::InvalidDirectCost { .. }
            | BomError::DirectCostOnComposite { .. }
            | BomError::MissingDirectCost { .. } => Self::validation("direct_cost", message),
            BomError::UnknownProduct { .. } | BomError::ComponentNotFound { .. } => {
                Self::not_found(message)
            }
            BomError::DuplicateComponent { .. } => Self::conflict(message),
            BomError::CyclicBom { .. } => Self::BomCycle { message },
            BomError::CyclicBomError { .. } | BomError::DepthLimitExceeded { .. } => {
                Self::Integrity { message }
            }
            BomError::CostOverflow { .. } => Self::internal(message),
            BomError::Storage { .. } => Self::database(message),
        }
    }
}

// Conversion from common error types
impl From<sqlx::Error> for MeridianError {
    fn from(error: sqlx::Error) -> Self {
        Self::database(error.to_string())
    }
}

impl From<serde_json::Error> for MeridianError {
    fn from(error: serde_json::Error) -> Self {
        Self::validation("JSON", error.to_string())
    }
}

impl From<config::ConfigError> for MeridianError {
    fn from(error: config::ConfigError) -> Self {
        Self::Configuration {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn test_structural_bom_errors_are_client_errors() {
        let parent_id = Uuid::new_v4();
        let component_id = Uuid::new_v4();

        let cases = vec![
            (BomError::InvalidQuantity { quantity: Decimal::ZERO }, 400),
            (BomError::NotComposite { product_id: parent_id }, 400),
            (BomError::UnknownComponent { component_id }, 400),
            (BomError::UnknownProduct { product_id: parent_id }, 404),
            (BomError::ComponentNotFound { parent_id, component_id }, 404),
            (BomError::DuplicateComponent { parent_id, component_id }, 409),
            (BomError::CyclicBom { parent_id, component_id }, 409),
            (BomError::InvalidDirectCost { product_id: component_id, direct_cost: Decimal::NEGATIVE_ONE }, 400),
            (BomError::DirectCostOnComposite { product_id: parent_id }, 400),
        ];

        for (bom_error, status) in cases {
            let error: MeridianError = bom_error.into();
            assert_eq!(error.http_status_code(), status, "{}", error);
        }
    }

    #[test]
    fn test_defensive_cycle_error_is_internal() {
        let product_id = Uuid::new_v4();
        let error: MeridianError = BomError::CyclicBomError {
            product_id,
            path: vec![product_id],
        }
        .into();

        assert_eq!(error.error_code(), "DATA_INTEGRITY_ERROR");
        assert_eq!(error.http_status_code(), 500);
    }

    #[test]
    fn test_error_response_carries_code() {
        let response: ErrorResponse = MeridianError::conflict("product still referenced").into();
        assert_eq!(response.code, "CONFLICT");
        assert!(response.message.contains("product still referenced"));
    }
}
