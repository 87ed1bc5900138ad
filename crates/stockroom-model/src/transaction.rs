// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

use crate::validate::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Inbound,
    Outbound,
    Transfer,
    Adjustment,
}

impl TransactionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
            Self::Transfer => "transfer",
            Self::Adjustment => "adjustment",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbound" => Ok(Self::Inbound),
            "outbound" => Ok(Self::Outbound),
            "transfer" => Ok(Self::Transfer),
            "adjustment" => Ok(Self::Adjustment),
            other => Err(ValidationError(format!(
                "unknown transaction type `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Default for TransactionStatus {
    fn default() -> Self {
        Self::Completed
    }
}

impl FromStr for TransactionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ValidationError(format!(
                "unknown transaction status `{other}`"
            ))),
        }
    }
}

/// Persisted stock movement. `destination_warehouse_id` is set for transfers
/// only; `warehouse_id` is the source side in that case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTransaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub reference_number: String,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub destination_warehouse_id: Option<Uuid>,
    pub user_id: Uuid,
    pub quantity: i64,
    pub unit_cost: f64,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub supplier_name: Option<String>,
    pub supplier_contact: Option<String>,
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub transaction_date: DateTime<Utc>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockTransaction {
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.quantity as f64 * self.unit_cost
    }
}

/// Builds a reference number of the form `INBOUND-20260829-042137`.
#[must_use]
pub fn reference_number(kind: TransactionKind, on: DateTime<Utc>, suffix: u32) -> String {
    format!(
        "{}-{}-{:06}",
        kind.as_str().to_ascii_uppercase(),
        on.format("%Y%m%d"),
        suffix % 1_000_000
    )
}
