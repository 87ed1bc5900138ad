// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::validate::{require_len, require_non_negative, ValidationError};

pub const PRODUCT_CODE_MAX_LEN: usize = 50;
pub const PRODUCT_NAME_MAX_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub unit: String,
    pub unit_price: f64,
    pub cost_price: f64,
    pub min_stock_level: i64,
    pub max_stock_level: Option<i64>,
    pub weight: Option<f64>,
    pub dimensions: Option<String>,
    pub barcode: Option<String>,
    pub sku: Option<String>,
    pub image: Option<String>,
    pub is_active: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Validates every caller-supplied scalar field in one pass.
    pub fn validate_fields(
        code: &str,
        name: &str,
        unit: &str,
        unit_price: f64,
        cost_price: f64,
        min_stock_level: i64,
        max_stock_level: Option<i64>,
        weight: Option<f64>,
    ) -> Result<(), ValidationError> {
        validate_product_code(code)?;
        validate_product_name(name)?;
        validate_unit(unit)?;
        require_non_negative("unitPrice", unit_price)?;
        require_non_negative("costPrice", cost_price)?;
        if min_stock_level < 0 {
            return Err(ValidationError("minStockLevel must be >= 0".to_string()));
        }
        if matches!(max_stock_level, Some(v) if v < 0) {
            return Err(ValidationError("maxStockLevel must be >= 0".to_string()));
        }
        if let Some(w) = weight {
            require_non_negative("weight", w)?;
        }
        Ok(())
    }
}

pub fn validate_product_code(value: &str) -> Result<(), ValidationError> {
    require_len("code", value.trim(), 2, PRODUCT_CODE_MAX_LEN)
}

pub fn validate_product_name(value: &str) -> Result<(), ValidationError> {
    require_len("name", value.trim(), 2, PRODUCT_NAME_MAX_LEN)
}

pub fn validate_unit(value: &str) -> Result<(), ValidationError> {
    require_len("unit", value.trim(), 1, 20)
}
