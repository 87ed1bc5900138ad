// SPDX-License-Identifier: Apache-2.0

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Leading segment of every issued token; lets rotated formats coexist.
pub const TOKEN_PREFIX: &str = "skr1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessClaims {
    pub user_id: String,
    pub username: String,
    pub role: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Signs claims into `skr1.<payload-b64>.<sig-b64>`.
pub fn sign_token(secret: &[u8], claims: &AccessClaims) -> String {
    let payload = URL_SAFE_NO_PAD
        .encode(serde_json::to_vec(claims).unwrap_or_default());
    let sig = signature(secret, &payload);
    format!("{TOKEN_PREFIX}.{payload}.{sig}")
}

/// Verifies signature and expiry, returning the embedded claims.
pub fn verify_token(secret: &[u8], token: &str, now_unix: i64) -> Result<AccessClaims> {
    let mut parts = token.split('.');
    let prefix = parts.next().unwrap_or_default();
    if prefix != TOKEN_PREFIX {
        return Err(Error::MalformedToken {
            reason: "unknown prefix",
        });
    }
    let payload = parts.next().ok_or(Error::MalformedToken {
        reason: "missing payload",
    })?;
    let sig = parts.next().ok_or(Error::MalformedToken {
        reason: "missing signature",
    })?;
    if parts.next().is_some() {
        return Err(Error::MalformedToken {
            reason: "trailing segments",
        });
    }

    let sig_bytes = URL_SAFE_NO_PAD.decode(sig).map_err(|_| Error::MalformedToken {
        reason: "signature encoding",
    })?;
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| Error::MalformedToken {
        reason: "empty secret",
    })?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&sig_bytes)
        .map_err(|_| Error::BadTokenSignature)?;

    let raw = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| Error::MalformedToken {
            reason: "payload encoding",
        })?;
    let claims: AccessClaims =
        serde_json::from_slice(&raw).map_err(|_| Error::MalformedToken {
            reason: "payload schema",
        })?;
    if claims.expires_at <= now_unix {
        return Err(Error::TokenExpired);
    }
    Ok(claims)
}

fn signature(secret: &[u8], payload: &str) -> String {
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac = HmacSha256::new_from_slice(secret).expect("hmac key length");
    mac.update(payload.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}
