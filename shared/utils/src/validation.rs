use crate::error::{MeridianError, MeridianResult};
use validator::{Validate, ValidationErrors};

pub fn validate_model<T: Validate>(model: &T) -> MeridianResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages = format_validation_errors(&errors);
            Err(MeridianError::validation("model", error_messages))
        }
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match &error.code {
                std::borrow::Cow::Borrowed("length") => {
                    format!("Length validation failed for field '{}'", field)
                }
                std::borrow::Cow::Borrowed("non_positive_quantity") => {
                    format!("Field '{}' must be greater than zero", field)
                }
                std::borrow::Cow::Borrowed("leaf_requires_direct_cost") => {
                    "Leaf products require a direct cost".to_string()
                }
                std::borrow::Cow::Borrowed("composite_has_direct_cost") => {
                    "Composite products derive their cost from their BOM".to_string()
                }
                std::borrow::Cow::Borrowed("negative_direct_cost") => {
                    "Direct cost cannot be negative".to_string()
                }
                _ => format!("Validation failed for field '{}': {}", field, error.code),
            };
            messages.push(message);
        }
    }

    messages.sort();
    messages.join(", ")
}

pub fn validate_uuid(uuid_str: &str) -> MeridianResult<uuid::Uuid> {
    uuid::Uuid::parse_str(uuid_str)
        .map_err(|_| MeridianError::validation("uuid", "Invalid UUID format"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_models::{ChangeContext, ComponentEdge, Product};
    use rust_decimal::Decimal;

    #[test]
    fn test_validate_model_reports_schema_errors() {
        let mut product = Product::leaf("LF-100", "Washer", Decimal::ONE);
        product.direct_cost = None;

        let error = validate_model(&product).unwrap_err();
        assert_eq!(error.http_status_code(), 400);
        assert!(error.to_string().contains("Leaf products require a direct cost"));
    }

    #[test]
    fn test_validate_model_reports_quantity() {
        let ctx = ChangeContext::system();
        let edge = ComponentEdge::new(uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), Decimal::ZERO, &ctx);

        let error = validate_model(&edge).unwrap_err();
        assert!(error.to_string().contains("'quantity' must be greater than zero"));
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("67e55044-10b1-426f-9247-bb680e5fe0c8").is_ok());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
