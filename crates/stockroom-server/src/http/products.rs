// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::{json, Value};
use stockroom_api::{
    parse_page_params, parse_product_params, ApiError, CreateProductRequest, Pagination,
    UpdateProductRequest, MAX_PRODUCT_PAGE_LIMIT,
};
use stockroom_model::Product;
use stockroom_store::products;
use stockroom_store::products::{ProductFilter, ProductPatch};
use stockroom_store::inventory;
use uuid::Uuid;

use crate::auth::{require_manage, CurrentUser};
use crate::http::{created, fail, inventory_json, ok, ok_message, product_json, store_fail};
use crate::AppState;

pub(crate) async fn list_products_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let page = match parse_page_params(&query, MAX_PRODUCT_PAGE_LIMIT) {
        Ok(page) => page,
        Err(err) => return fail(err),
    };
    let params = match parse_product_params(&query) {
        Ok(params) => params,
        Err(err) => return fail(err),
    };
    let filter = ProductFilter {
        search: params.search,
        category_id: params.category_id,
        is_active: params.is_active,
    };

    let conn = state.db.lock().await;
    match products::list(&conn, &filter, page.limit, page.offset()) {
        Ok(result) => {
            let items: Vec<Value> = result.items.iter().map(product_json).collect();
            ok(json!({
                "products": items,
                "pagination": Pagination::new(&page, result.total),
            }))
        }
        Err(err) => store_fail(err),
    }
}

/// Product detail plus its stock rows per warehouse.
pub(crate) async fn get_product_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let conn = state.db.lock().await;
    let row = match products::find_by_id(&conn, id) {
        Ok(row) => row,
        Err(err) => return store_fail(err),
    };
    match inventory::list_for_product(&conn, id) {
        Ok(stock) => {
            let stock: Vec<Value> = stock.iter().map(inventory_json).collect();
            ok(json!({"product": product_json(&row), "inventory": stock}))
        }
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn create_product_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreateProductRequest>,
) -> Response {
    if let Err(response) = require_manage(&current) {
        return response;
    }
    let cost_price = body.cost_price.unwrap_or(0.0);
    let min_stock_level = body.min_stock_level.unwrap_or(0);
    if let Err(e) = Product::validate_fields(
        &body.code,
        &body.name,
        &body.unit,
        body.unit_price,
        cost_price,
        min_stock_level,
        body.max_stock_level,
        body.weight,
    ) {
        return fail(ApiError::validation(&e.0));
    }

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4(),
        code: body.code.trim().to_string(),
        name: body.name.trim().to_string(),
        description: body.description,
        category_id: body.category_id,
        unit: body.unit.trim().to_string(),
        unit_price: body.unit_price,
        cost_price,
        min_stock_level,
        max_stock_level: body.max_stock_level,
        weight: body.weight,
        dimensions: body.dimensions,
        barcode: body.barcode,
        sku: body.sku,
        image: None,
        is_active: true,
        tags: body.tags.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    };
    let conn = state.db.lock().await;
    if let Err(err) = products::insert(&conn, &product) {
        return store_fail(err);
    }
    match products::find_by_id(&conn, product.id) {
        Ok(row) => created("product created", json!({"product": product_json(&row)})),
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn update_product_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProductRequest>,
) -> Response {
    if let Err(response) = require_manage(&current) {
        return response;
    }
    if let Err(err) = validate_update(&body) {
        return fail(err);
    }

    let patch = ProductPatch {
        code: body.code.map(|s| s.trim().to_string()),
        name: body.name.map(|s| s.trim().to_string()),
        description: body.description,
        category_id: body.category_id,
        unit: body.unit.map(|s| s.trim().to_string()),
        unit_price: body.unit_price,
        cost_price: body.cost_price,
        min_stock_level: body.min_stock_level,
        max_stock_level: body.max_stock_level,
        weight: body.weight,
        dimensions: body.dimensions,
        barcode: body.barcode,
        sku: body.sku,
        tags: body.tags,
        is_active: body.is_active,
    };
    let conn = state.db.lock().await;
    match products::update(&conn, id, &patch, Utc::now()) {
        Ok(row) => ok_message("product updated", json!({"product": product_json(&row)})),
        Err(err) => store_fail(err),
    }
}

fn validate_update(body: &UpdateProductRequest) -> Result<(), ApiError> {
    use stockroom_model::{validate_product_code, validate_product_name, validate_unit};

    if let Some(code) = &body.code {
        validate_product_code(code).map_err(|e| ApiError::validation(&e.0))?;
    }
    if let Some(name) = &body.name {
        validate_product_name(name).map_err(|e| ApiError::validation(&e.0))?;
    }
    if let Some(unit) = &body.unit {
        validate_unit(unit).map_err(|e| ApiError::validation(&e.0))?;
    }
    for (field, value) in [
        ("unitPrice", body.unit_price),
        ("costPrice", body.cost_price),
        ("weight", body.weight),
    ] {
        if matches!(value, Some(v) if !v.is_finite() || v < 0.0) {
            return Err(ApiError::validation(&format!("{field} must be >= 0")));
        }
    }
    for (field, value) in [
        ("minStockLevel", body.min_stock_level),
        ("maxStockLevel", body.max_stock_level),
    ] {
        if matches!(value, Some(v) if v < 0) {
            return Err(ApiError::validation(&format!("{field} must be >= 0")));
        }
    }
    Ok(())
}

pub(crate) async fn delete_product_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(response) = require_manage(&current) {
        return response;
    }
    let conn = state.db.lock().await;
    match products::delete(&conn, id) {
        Ok(()) => ok_message("product deleted", json!({})),
        Err(err) => store_fail(err),
    }
}
