// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::{Extension, Json};
use serde_json::{json, Value};
use stockroom_api::{
    parse_page_params, parse_transaction_params, ApiError, CreateTransactionRequest, Pagination,
    MAX_TRANSACTION_PAGE_LIMIT,
};
use stockroom_model::TransactionKind;
use stockroom_store::transactions;
use stockroom_store::transactions::{Posting, TransactionFilter};
use uuid::Uuid;

use crate::auth::{require_manage, CurrentUser};
use crate::http::{created, fail, ok, store_fail, transaction_json};
use crate::AppState;

pub(crate) async fn list_transactions_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let page = match parse_page_params(&query, MAX_TRANSACTION_PAGE_LIMIT) {
        Ok(page) => page,
        Err(err) => return fail(err),
    };
    let params = match parse_transaction_params(&query) {
        Ok(params) => params,
        Err(err) => return fail(err),
    };
    let filter = TransactionFilter {
        kind: params.kind,
        warehouse_id: params.warehouse_id,
        product_id: params.product_id,
        start_date: params.start_date,
        end_date: params.end_date,
    };

    let conn = state.db.lock().await;
    match transactions::list(&conn, &filter, page.limit, page.offset()) {
        Ok(result) => {
            let items: Vec<Value> = result.items.iter().map(transaction_json).collect();
            ok(json!({
                "transactions": items,
                "pagination": Pagination::new(&page, result.total),
            }))
        }
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn get_transaction_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let conn = state.db.lock().await;
    match transactions::find_by_id(&conn, id) {
        Ok(row) => ok(json!({"transaction": transaction_json(&row)})),
        Err(err) => store_fail(err),
    }
}

/// Posts a stock movement. The posting user is the authenticated caller,
/// never taken from the body.
pub(crate) async fn create_transaction_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreateTransactionRequest>,
) -> Response {
    if let Err(response) = require_manage(&current) {
        return response;
    }
    let kind = match body.kind.parse::<TransactionKind>() {
        Ok(kind) => kind,
        Err(e) => return fail(ApiError::validation(&e.0)),
    };

    let posting = Posting {
        kind,
        product_id: body.product_id,
        warehouse_id: body.warehouse_id,
        destination_warehouse_id: body.destination_warehouse_id,
        user_id: current.id,
        quantity: body.quantity,
        unit_cost: body.unit_cost.unwrap_or(0.0),
        reason: body.reason,
        notes: body.notes,
        supplier_name: body.supplier_name,
        supplier_contact: body.supplier_contact,
        customer_name: body.customer_name,
        customer_contact: body.customer_contact,
        batch_number: body.batch_number,
        expiry_date: body.expiry_date,
        transaction_date: body.transaction_date,
    };

    let mut conn = state.db.lock().await;
    match transactions::post_transaction(&mut conn, &posting) {
        Ok(row) => created(
            "transaction posted",
            json!({"transaction": transaction_json(&row)}),
        ),
        Err(err) => store_fail(err),
    }
}
