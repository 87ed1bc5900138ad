use axum::extract::{Path, State};
use axum::response::Response;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::json;
use stockroom_api::{ApiError, CreateCategoryRequest, UpdateCategoryRequest};
use stockroom_model::{validate_category_name, Category};
use stockroom_store::categories;
use stockroom_store::categories::CategoryPatch;
use uuid::Uuid;

use crate::auth::{require_manage, CurrentUser};
use crate::http::{created, fail, ok, ok_message, store_fail};
use crate::AppState;

pub(crate) async fn list_categories_handler(State(state): State<AppState>) -> Response {
    let conn = state.db.lock().await;
    match categories::list(&conn) {
        Ok(rows) => ok(json!({"categories": rows, "count": rows.len()})),
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn get_category_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let conn = state.db.lock().await;
    match categories::find_by_id(&conn, id) {
        Ok(category) => ok(json!({"category": category})),
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn create_category_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreateCategoryRequest>,
) -> Response {
    if let Err(response) = require_manage(&current) {
        return response;
    }
    if let Err(e) = validate_category_name(&body.name) {
        return fail(ApiError::validation(&e.0));
    }
    let now = Utc::now();
    let category = Category {
        id: Uuid::new_v4(),
        name: body.name.trim().to_string(),
        description: body.description,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    let conn = state.db.lock().await;
    match categories::insert(&conn, &category) {
        Ok(()) => created("category created", json!({"category": category})),
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn update_category_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Response {
    if let Err(response) = require_manage(&current) {
        return response;
    }
    if let Some(name) = &body.name {
        if let Err(e) = validate_category_name(name) {
            return fail(ApiError::validation(&e.0));
        }
    }
    let patch = CategoryPatch {
        name: body.name.map(|s| s.trim().to_string()),
        description: body.description,
        is_active: body.is_active,
    };
    let conn = state.db.lock().await;
    match categories::update(&conn, id, &patch, Utc::now()) {
        Ok(category) => ok_message("category updated", json!({"category": category})),
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn delete_category_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(response) = require_manage(&current) {
        return response;
    }
    let conn = state.db.lock().await;
    match categories::delete(&conn, id) {
        Ok(()) => ok_message("category deleted", json!({})),
        Err(err) => store_fail(err),
    }
}
