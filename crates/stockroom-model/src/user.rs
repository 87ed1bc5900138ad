use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::role::Role;
use crate::validate::{require_len, ValidationError};

/// Persisted user row. The password hash never leaves the store/auth layers;
/// this type deliberately does not implement `Serialize`.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

pub fn validate_username(value: &str) -> Result<(), ValidationError> {
    require_len("username", value, 3, 50)?;
    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError(
            "username must be alphanumeric".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    let Some((local, domain)) = value.split_once('@') else {
        return Err(ValidationError("email must contain '@'".to_string()));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || value.contains(' ') {
        return Err(ValidationError("email is not valid".to_string()));
    }
    require_len("email", value, 3, 255)
}

pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    require_len("password", value, 6, 255)
}

pub fn validate_person_name(field: &str, value: &str) -> Result<(), ValidationError> {
    require_len(field, value.trim(), 2, 50)
}
