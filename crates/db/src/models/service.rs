//! Service catalog entity model and DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};
use youneed_core::types::{DbId, Timestamp};

/// A row from the `services` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Service {
    pub id: DbId,
    pub provider_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub duration_minutes: Option<i32>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a service. The owning provider comes from the caller.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateService {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[validate(range(min = 1, max = 10080))]
    pub duration_minutes: Option<i32>,
}

/// DTO for updating a service. All fields are optional.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateService {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,
    #[validate(range(min = 1, max = 10080))]
    pub duration_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

/// Query parameters for `GET /services`.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceListQuery {
    pub provider_id: Option<DbId>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("price_negative"));
    }
    if price.scale() > 2 {
        return Err(ValidationError::new("price_precision"));
    }
    Ok(())
}
