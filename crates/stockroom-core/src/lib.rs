#![forbid(unsafe_code)]
//! Stockroom foundation crate: error model, hashing, credentials, tokens.

mod error;
mod password;
mod token;

pub use error::{Error, Result};
pub use password::{hash_password, verify_password, DEFAULT_PBKDF2_ITERATIONS};
pub use token::{sign_token, verify_token, AccessClaims, TOKEN_PREFIX};

pub const CRATE_NAME: &str = "stockroom-core";
