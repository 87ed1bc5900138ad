// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ApiErrorCode {
    ValidationFailed,
    InvalidCredentials,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    InsufficientStock,
    DeleteBlocked,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ApiErrorCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: json!({}),
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    #[must_use]
    pub fn validation(message: &str) -> Self {
        Self::new(ApiErrorCode::ValidationFailed, message)
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self {
            code: ApiErrorCode::ValidationFailed,
            message: format!("invalid query parameter: {name}"),
            details: json!({"parameter": name, "value": value}),
        }
    }

    #[must_use]
    pub fn not_found(what: &str) -> Self {
        Self::new(ApiErrorCode::NotFound, &format!("{what} not found"))
    }

    #[must_use]
    pub fn conflict(message: &str) -> Self {
        Self::new(ApiErrorCode::Conflict, message)
    }
}

/// HTTP status for each error code. Conflicts map to 400 (not 409); the
/// frontend consumes those bodies as plain validation failures.
#[must_use]
pub fn api_error_status(code: ApiErrorCode) -> u16 {
    match code {
        ApiErrorCode::ValidationFailed
        | ApiErrorCode::Conflict
        | ApiErrorCode::InsufficientStock
        | ApiErrorCode::DeleteBlocked => 400,
        ApiErrorCode::InvalidCredentials | ApiErrorCode::Unauthorized => 401,
        ApiErrorCode::Forbidden => 403,
        ApiErrorCode::NotFound => 404,
        ApiErrorCode::Internal => 500,
    }
}
