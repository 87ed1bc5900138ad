// SPDX-License-Identifier: Apache-2.0

//! Bearer-token middleware. The user row is re-loaded on every request so a
//! deactivated account loses access immediately, not at token expiry.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use stockroom_api::{ApiError, ApiErrorCode};
use stockroom_core::verify_token;
use stockroom_model::Role;
use uuid::Uuid;

use crate::http::fail;
use crate::AppState;

/// The authenticated caller, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

pub(crate) async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        return fail(ApiError::new(
            ApiErrorCode::Unauthorized,
            "missing bearer token",
        ));
    };

    let claims = match verify_token(&state.config.token_secret, &token, Utc::now().timestamp()) {
        Ok(claims) => claims,
        Err(err) => {
            return fail(ApiError::new(ApiErrorCode::Unauthorized, &err.to_string()));
        }
    };
    let Ok(user_id) = claims.user_id.parse::<Uuid>() else {
        return fail(ApiError::new(ApiErrorCode::Unauthorized, "invalid token"));
    };

    let user = {
        let conn = state.db.lock().await;
        stockroom_store::users::find_by_id(&conn, user_id)
    };
    let user = match user {
        Ok(user) => user,
        Err(_) => {
            return fail(ApiError::new(ApiErrorCode::Unauthorized, "unknown user"));
        }
    };
    if !user.is_active {
        return fail(ApiError::new(
            ApiErrorCode::Unauthorized,
            "account is deactivated",
        ));
    }

    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
        role: user.role,
    });
    next.run(request).await
}

fn bearer_token(request: &Request<Body>) -> Option<String> {
    let header = request.headers().get("authorization")?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Guard for mutating routes; `Err` carries the ready-made 403 response.
pub(crate) fn require_manage(user: &CurrentUser) -> Result<(), Response> {
    if user.role.can_manage() {
        Ok(())
    } else {
        Err(fail(ApiError::new(
            ApiErrorCode::Forbidden,
            "this action requires a manager or admin role",
        )))
    }
}

pub(crate) fn require_admin(user: &CurrentUser) -> Result<(), Response> {
    if user.role == Role::Admin {
        Ok(())
    } else {
        Err(fail(ApiError::new(
            ApiErrorCode::Forbidden,
            "this action requires the admin role",
        )))
    }
}
