use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::validate::{require_len, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn validate_category_name(value: &str) -> Result<(), ValidationError> {
    require_len("name", value.trim(), 2, 100)
}
