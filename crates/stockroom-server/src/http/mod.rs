// SPDX-License-Identifier: Apache-2.0

//! Response envelope and JSON shapes shared by the handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use stockroom_api::{api_error_status, ApiError, ApiErrorCode};
use stockroom_model::User;
use stockroom_store::inventory::InventoryRow;
use stockroom_store::products::ProductRow;
use stockroom_store::transactions::TransactionRow;
use stockroom_store::StoreError;
use tracing::error;

pub(crate) mod categories;
pub(crate) mod dashboard;
pub(crate) mod inventory;
pub(crate) mod products;
pub(crate) mod reports;
pub(crate) mod sessions;
pub(crate) mod transactions;
pub(crate) mod users;
pub(crate) mod warehouses;

pub(crate) fn ok(data: Value) -> Response {
    Json(json!({"success": true, "data": data})).into_response()
}

pub(crate) fn ok_message(message: &str, data: Value) -> Response {
    Json(json!({"success": true, "message": message, "data": data})).into_response()
}

pub(crate) fn created(message: &str, data: Value) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({"success": true, "message": message, "data": data})),
    )
        .into_response()
}

pub(crate) fn fail(err: ApiError) -> Response {
    let status = StatusCode::from_u16(api_error_status(err.code))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"success": false, "error": err}))).into_response()
}

/// Store failures become API errors; SQLite internals are logged, not leaked.
pub(crate) fn store_fail(err: StoreError) -> Response {
    let api_err = match err {
        StoreError::NotFound(what) => ApiError::not_found(what),
        StoreError::MissingReference(what) => {
            ApiError::validation(&format!("invalid {what} reference"))
        }
        StoreError::Conflict(message) => ApiError::conflict(&message),
        StoreError::InsufficientStock {
            available,
            requested,
        } => ApiError::new(
            ApiErrorCode::InsufficientStock,
            "insufficient inventory quantity",
        )
        .with_details(json!({"available": available, "requested": requested})),
        StoreError::InvalidPosting(message) => ApiError::validation(&message),
        StoreError::Sqlite(sql_err) => {
            error!(error = %sql_err, "store query failed");
            ApiError::new(ApiErrorCode::Internal, "internal error")
        }
    };
    fail(api_err)
}

pub(crate) async fn not_found_handler() -> Response {
    fail(ApiError::not_found("route"))
}

pub(crate) async fn health_handler() -> Response {
    ok(json!({"status": "ok"}))
}

/// Public view of a user row; the password hash never appears here.
pub(crate) fn user_json(user: &User) -> Value {
    json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "firstName": user.first_name,
        "lastName": user.last_name,
        "fullName": user.full_name(),
        "role": user.role,
        "isActive": user.is_active,
        "lastLogin": user.last_login,
        "avatar": user.avatar,
        "createdAt": user.created_at,
        "updatedAt": user.updated_at,
    })
}

pub(crate) fn product_json(row: &ProductRow) -> Value {
    let mut value = serde_json::to_value(&row.product).unwrap_or_else(|_| json!({}));
    if let Some(map) = value.as_object_mut() {
        map.insert(
            "category".to_string(),
            json!({"id": row.product.category_id, "name": row.category_name}),
        );
    }
    value
}

pub(crate) fn inventory_json(row: &InventoryRow) -> Value {
    let mut value = serde_json::to_value(&row.inventory).unwrap_or_else(|_| json!({}));
    if let Some(map) = value.as_object_mut() {
        map.insert("availableQuantity".to_string(), json!(row.inventory.available_quantity()));
        map.insert("isLowStock".to_string(), json!(row.is_low_stock()));
        map.insert("stockValue".to_string(), json!(row.stock_value()));
        map.insert(
            "product".to_string(),
            json!({
                "id": row.inventory.product_id,
                "code": row.product_code,
                "name": row.product_name,
                "unit": row.product_unit,
                "minStockLevel": row.min_stock_level,
                "category": row.category_name,
            }),
        );
        map.insert(
            "warehouse".to_string(),
            json!({
                "id": row.inventory.warehouse_id,
                "name": row.warehouse_name,
                "code": row.warehouse_code,
            }),
        );
    }
    value
}

pub(crate) fn transaction_json(row: &TransactionRow) -> Value {
    let mut value = serde_json::to_value(&row.transaction).unwrap_or_else(|_| json!({}));
    if let Some(map) = value.as_object_mut() {
        map.insert("totalCost".to_string(), json!(row.transaction.total_cost()));
        map.insert(
            "product".to_string(),
            json!({
                "id": row.transaction.product_id,
                "code": row.product_code,
                "name": row.product_name,
                "unit": row.product_unit,
            }),
        );
        map.insert(
            "warehouse".to_string(),
            json!({
                "id": row.transaction.warehouse_id,
                "name": row.warehouse_name,
                "code": row.warehouse_code,
            }),
        );
        map.insert(
            "destinationWarehouse".to_string(),
            match (
                row.transaction.destination_warehouse_id,
                &row.destination_warehouse_name,
            ) {
                (Some(id), Some(name)) => json!({"id": id, "name": name}),
                _ => Value::Null,
            },
        );
        map.insert(
            "user".to_string(),
            json!({
                "id": row.transaction.user_id,
                "username": row.username,
                "fullName": row.user_full_name,
            }),
        );
    }
    value
}
