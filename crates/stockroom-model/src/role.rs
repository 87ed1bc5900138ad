// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::validate::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    WarehouseManager,
    Viewer,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::WarehouseManager => "warehouse_manager",
            Self::Viewer => "viewer",
        }
    }

    /// Whether this role may mutate catalog and stock data.
    #[must_use]
    pub const fn can_manage(self) -> bool {
        matches!(self, Self::Admin | Self::WarehouseManager)
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Viewer
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "warehouse_manager" => Ok(Self::WarehouseManager),
            "viewer" => Ok(Self::Viewer),
            other => Err(ValidationError(format!("unknown role `{other}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings_round_trip() {
        for role in [Role::Admin, Role::WarehouseManager, Role::Viewer] {
            assert_eq!(role.as_str().parse::<Role>().expect("parse"), role);
        }
    }

    #[test]
    fn only_admin_and_manager_can_manage() {
        assert!(Role::Admin.can_manage());
        assert!(Role::WarehouseManager.can_manage());
        assert!(!Role::Viewer.can_manage());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::WarehouseManager).expect("serialize");
        assert_eq!(json, "\"warehouse_manager\"");
    }
}
