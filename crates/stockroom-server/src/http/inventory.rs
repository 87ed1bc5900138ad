use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::response::Response;
use serde_json::{json, Value};
use stockroom_api::parse_inventory_params;
use stockroom_store::inventory;
use stockroom_store::inventory::InventoryFilter;

use crate::http::{fail, inventory_json, ok, store_fail};
use crate::AppState;

pub(crate) async fn list_inventory_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let params = match parse_inventory_params(&query) {
        Ok(params) => params,
        Err(err) => return fail(err),
    };
    let filter = InventoryFilter {
        warehouse_id: params.warehouse_id,
        product_id: params.product_id,
        category_id: params.category_id,
        low_stock: params.low_stock,
    };
    let conn = state.db.lock().await;
    match inventory::list(&conn, &filter) {
        Ok(rows) => {
            let items: Vec<Value> = rows.iter().map(inventory_json).collect();
            ok(json!({"inventory": items, "count": items.len()}))
        }
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn inventory_summary_handler(State(state): State<AppState>) -> Response {
    let conn = state.db.lock().await;
    match inventory::summary(&conn) {
        Ok(summary) => ok(json!({"summary": summary})),
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn low_stock_handler(State(state): State<AppState>) -> Response {
    let conn = state.db.lock().await;
    match inventory::low_stock(&conn) {
        Ok(rows) => {
            let items: Vec<Value> = rows.iter().map(inventory_json).collect();
            ok(json!({"inventory": items, "count": items.len()}))
        }
        Err(err) => store_fail(err),
    }
}
