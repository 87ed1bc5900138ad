use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::validate::{require_len, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub manager_name: Option<String>,
    pub capacity: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn validate_warehouse_name(value: &str) -> Result<(), ValidationError> {
    require_len("name", value.trim(), 2, 100)
}

/// Warehouse codes are short uppercase alphanumeric identifiers (e.g. `MW01`).
pub fn validate_warehouse_code(value: &str) -> Result<(), ValidationError> {
    require_len("code", value, 2, 20)?;
    if !value
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(ValidationError(
            "code must be uppercase alphanumeric".to_string(),
        ));
    }
    Ok(())
}
