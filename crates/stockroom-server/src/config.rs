// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use stockroom_core::DEFAULT_PBKDF2_ITERATIONS;

/// Runtime configuration, populated from the environment in `main`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    /// Key for signing access tokens. Must not be empty.
    pub token_secret: Vec<u8>,
    pub token_ttl_secs: i64,
    pub max_body_bytes: usize,
    pub pbkdf2_iterations: u32,
    /// Create an admin account on first start with an empty users table.
    pub seed_admin: bool,
    pub seed_admin_username: String,
    pub seed_admin_password: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("artifacts/stockroom.db"),
            token_secret: Vec::new(),
            token_ttl_secs: 24 * 60 * 60,
            max_body_bytes: 64 * 1024,
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
            seed_admin: true,
            seed_admin_username: "admin".to_string(),
            seed_admin_password: "admin123".to_string(),
        }
    }
}

impl ServerConfig {
    /// Startup contract; a violation here should abort boot.
    pub fn validate(&self) -> Result<(), String> {
        if self.token_secret.is_empty() {
            return Err("token secret must not be empty (set STOCKROOM_TOKEN_SECRET)".to_string());
        }
        if self.token_ttl_secs <= 0 {
            return Err("token ttl must be positive".to_string());
        }
        if self.max_body_bytes == 0 {
            return Err("max body bytes must be positive".to_string());
        }
        if self.pbkdf2_iterations == 0 {
            return Err("pbkdf2 iterations must be positive".to_string());
        }
        if self.seed_admin && self.seed_admin_password.len() < 6 {
            return Err("seed admin password must be at least 6 characters".to_string());
        }
        Ok(())
    }
}
