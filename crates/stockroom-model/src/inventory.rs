use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One stock row per (product, warehouse) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity: i64,
    pub reserved_quantity: i64,
    pub location: Option<String>,
    pub last_count_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Inventory {
    #[must_use]
    pub fn available_quantity(&self) -> i64 {
        self.quantity - self.reserved_quantity
    }
}
