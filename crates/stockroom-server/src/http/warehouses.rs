use axum::extract::{Path, State};
use axum::response::Response;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::json;
use stockroom_api::{ApiError, CreateWarehouseRequest, UpdateWarehouseRequest};
use stockroom_model::{validate_warehouse_code, validate_warehouse_name, Warehouse};
use stockroom_store::warehouses;
use stockroom_store::warehouses::WarehousePatch;
use uuid::Uuid;

use crate::auth::{require_manage, CurrentUser};
use crate::http::{created, fail, ok, ok_message, store_fail};
use crate::AppState;

const DEFAULT_COUNTRY: &str = "Iran";

pub(crate) async fn list_warehouses_handler(State(state): State<AppState>) -> Response {
    let conn = state.db.lock().await;
    match warehouses::list(&conn) {
        Ok(rows) => ok(json!({"warehouses": rows, "count": rows.len()})),
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn get_warehouse_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let conn = state.db.lock().await;
    match warehouses::find_by_id(&conn, id) {
        Ok(warehouse) => ok(json!({"warehouse": warehouse})),
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn create_warehouse_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreateWarehouseRequest>,
) -> Response {
    if let Err(response) = require_manage(&current) {
        return response;
    }
    if let Err(e) =
        validate_warehouse_name(&body.name).and_then(|()| validate_warehouse_code(&body.code))
    {
        return fail(ApiError::validation(&e.0));
    }
    if matches!(body.capacity, Some(c) if c < 0) {
        return fail(ApiError::validation("capacity must be >= 0"));
    }

    let now = Utc::now();
    let warehouse = Warehouse {
        id: Uuid::new_v4(),
        name: body.name.trim().to_string(),
        code: body.code,
        address: body.address,
        city: body.city,
        state: body.state,
        postal_code: body.postal_code,
        country: body.country.unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        phone: body.phone,
        email: body.email,
        manager_name: body.manager_name,
        capacity: body.capacity.unwrap_or(0),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    let conn = state.db.lock().await;
    match warehouses::insert(&conn, &warehouse) {
        Ok(()) => created("warehouse created", json!({"warehouse": warehouse})),
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn update_warehouse_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateWarehouseRequest>,
) -> Response {
    if let Err(response) = require_manage(&current) {
        return response;
    }
    if let Some(name) = &body.name {
        if let Err(e) = validate_warehouse_name(name) {
            return fail(ApiError::validation(&e.0));
        }
    }
    if let Some(code) = &body.code {
        if let Err(e) = validate_warehouse_code(code) {
            return fail(ApiError::validation(&e.0));
        }
    }
    if matches!(body.capacity, Some(c) if c < 0) {
        return fail(ApiError::validation("capacity must be >= 0"));
    }

    let patch = WarehousePatch {
        name: body.name.map(|s| s.trim().to_string()),
        code: body.code,
        address: body.address,
        city: body.city,
        state: body.state,
        postal_code: body.postal_code,
        country: body.country,
        phone: body.phone,
        email: body.email,
        manager_name: body.manager_name,
        capacity: body.capacity,
        is_active: body.is_active,
    };
    let conn = state.db.lock().await;
    match warehouses::update(&conn, id, &patch, Utc::now()) {
        Ok(warehouse) => ok_message("warehouse updated", json!({"warehouse": warehouse})),
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn delete_warehouse_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(response) = require_manage(&current) {
        return response;
    }
    let conn = state.db.lock().await;
    match warehouses::delete(&conn, id) {
        Ok(()) => ok_message("warehouse deleted", json!({})),
        Err(err) => store_fail(err),
    }
}
