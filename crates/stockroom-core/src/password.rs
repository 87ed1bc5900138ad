// SPDX-License-Identifier: Apache-2.0

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{Error, Result};

pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 50_000;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Hashes a password as `pbkdf2-sha256$<iters>$<salt-b64>$<hash-b64>` with a
/// fresh random salt.
#[must_use]
pub fn hash_password(password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut derived = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut derived);
    format!(
        "{SCHEME}${iterations}${}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(derived)
    )
}

/// Verifies a password against a stored hash. Comparison is constant-time.
pub fn verify_password(password: &str, encoded: &str) -> Result<bool> {
    let mut parts = encoded.split('$');
    let scheme = parts.next().unwrap_or_default();
    if scheme != SCHEME {
        return Err(Error::UnsupportedHashScheme {
            scheme: scheme.to_string(),
        });
    }
    let iterations: u32 = parts
        .next()
        .and_then(|raw| raw.parse().ok())
        .ok_or(Error::MalformedPasswordHash {
            reason: "missing iteration count",
        })?;
    let salt = decode_part(parts.next(), "missing salt")?;
    let expected = decode_part(parts.next(), "missing digest")?;
    if parts.next().is_some() {
        return Err(Error::MalformedPasswordHash {
            reason: "trailing fields",
        });
    }
    if expected.len() != HASH_LEN {
        return Err(Error::MalformedPasswordHash {
            reason: "digest length",
        });
    }

    let mut derived = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut derived);
    let mut diff = 0u8;
    for (a, b) in derived.iter().zip(expected.iter()) {
        diff |= a ^ b;
    }
    Ok(diff == 0)
}

fn decode_part(part: Option<&str>, reason: &'static str) -> Result<Vec<u8>> {
    let raw = part.ok_or(Error::MalformedPasswordHash { reason })?;
    URL_SAFE_NO_PAD
        .decode(raw)
        .map_err(|_| Error::MalformedPasswordHash { reason })
}
