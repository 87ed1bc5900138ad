// SPDX-License-Identifier: Apache-2.0

//! Registration, login and profile endpoints.

use axum::extract::State;
use axum::response::Response;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::json;
use stockroom_api::{
    ApiError, ApiErrorCode, ChangePasswordRequest, LoginRequest, RegisterRequest,
    UpdateProfileRequest,
};
use stockroom_core::{hash_password, sign_token, verify_password, AccessClaims};
use stockroom_model::{
    validate_email, validate_password, validate_person_name, validate_username, Role, User,
};
use stockroom_store::users;
use stockroom_store::users::ProfilePatch;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::http::{created, fail, ok, ok_message, store_fail, user_json};
use crate::AppState;

fn issue_token(state: &AppState, user: &User) -> String {
    let now = Utc::now().timestamp();
    let claims = AccessClaims {
        user_id: user.id.to_string(),
        username: user.username.clone(),
        role: user.role.as_str().to_string(),
        issued_at: now,
        expires_at: now + state.config.token_ttl_secs,
    };
    sign_token(&state.config.token_secret, &claims)
}

fn invalid_credentials() -> Response {
    fail(ApiError::new(
        ApiErrorCode::InvalidCredentials,
        "invalid username or password",
    ))
}

pub(crate) async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Response {
    if let Err(e) = validate_username(&body.username)
        .and_then(|()| validate_email(&body.email))
        .and_then(|()| validate_password(&body.password))
        .and_then(|()| validate_person_name("firstName", &body.first_name))
        .and_then(|()| validate_person_name("lastName", &body.last_name))
    {
        return fail(ApiError::validation(&e.0));
    }
    let role = match body.role.as_deref() {
        None => Role::default(),
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => role,
            Err(e) => return fail(ApiError::validation(&e.0)),
        },
    };

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        username: body.username,
        email: body.email,
        password_hash: hash_password(&body.password, state.config.pbkdf2_iterations),
        first_name: body.first_name.trim().to_string(),
        last_name: body.last_name.trim().to_string(),
        role,
        is_active: true,
        last_login: None,
        avatar: None,
        created_at: now,
        updated_at: now,
    };

    let result = {
        let conn = state.db.lock().await;
        users::insert(&conn, &user)
    };
    if let Err(err) = result {
        return store_fail(err);
    }
    let token = issue_token(&state, &user);
    created(
        "user registered",
        json!({"user": user_json(&user), "token": token}),
    )
}

pub(crate) async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Response {
    let conn = state.db.lock().await;
    let user = match users::find_by_identifier(&conn, &body.username) {
        Ok(Some(user)) => user,
        Ok(None) => return invalid_credentials(),
        Err(err) => return store_fail(err),
    };
    if !user.is_active {
        return invalid_credentials();
    }
    match verify_password(&body.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) | Err(_) => return invalid_credentials(),
    }
    let now = Utc::now();
    if let Err(err) = users::record_login(&conn, user.id, now) {
        return store_fail(err);
    }
    drop(conn);

    let token = issue_token(&state, &user);
    ok_message(
        "login successful",
        json!({"user": user_json(&user), "token": token}),
    )
}

pub(crate) async fn me_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    let conn = state.db.lock().await;
    match users::find_by_id(&conn, current.id) {
        Ok(user) => ok(json!({"user": user_json(&user)})),
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Response {
    if let Some(first_name) = &body.first_name {
        if let Err(e) = validate_person_name("firstName", first_name) {
            return fail(ApiError::validation(&e.0));
        }
    }
    if let Some(last_name) = &body.last_name {
        if let Err(e) = validate_person_name("lastName", last_name) {
            return fail(ApiError::validation(&e.0));
        }
    }
    if let Some(email) = &body.email {
        if let Err(e) = validate_email(email) {
            return fail(ApiError::validation(&e.0));
        }
    }

    let patch = ProfilePatch {
        first_name: body.first_name.map(|s| s.trim().to_string()),
        last_name: body.last_name.map(|s| s.trim().to_string()),
        email: body.email,
    };
    let conn = state.db.lock().await;
    match users::update_profile(&conn, current.id, &patch, Utc::now()) {
        Ok(user) => ok_message("profile updated", json!({"user": user_json(&user)})),
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn change_password_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> Response {
    if let Err(e) = validate_password(&body.new_password) {
        return fail(ApiError::validation(&e.0));
    }

    let conn = state.db.lock().await;
    let user = match users::find_by_id(&conn, current.id) {
        Ok(user) => user,
        Err(err) => return store_fail(err),
    };
    match verify_password(&body.current_password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            return fail(ApiError::new(
                ApiErrorCode::InvalidCredentials,
                "current password is incorrect",
            ));
        }
    }
    let hash = hash_password(&body.new_password, state.config.pbkdf2_iterations);
    match users::set_password_hash(&conn, current.id, &hash, Utc::now()) {
        Ok(()) => ok_message("password changed", json!({})),
        Err(err) => store_fail(err),
    }
}
