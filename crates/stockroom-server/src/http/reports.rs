// SPDX-License-Identifier: Apache-2.0

//! Inventory and transaction reports, as JSON or as a generated XLSX
//! workbook.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde_json::{json, Value};
use stockroom_api::{
    parse_date_range, parse_inventory_params, parse_report_format, ApiError, ApiErrorCode,
    ReportFormat,
};
use stockroom_model::TransactionKind;
use stockroom_store::inventory;
use stockroom_store::inventory::{InventoryFilter, InventoryRow};
use stockroom_store::transactions;
use stockroom_store::transactions::TransactionRow;
use tracing::error;

use crate::http::{fail, inventory_json, ok, store_fail, transaction_json};
use crate::AppState;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub(crate) async fn inventory_report_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let format = match parse_report_format(&query) {
        Ok(format) => format,
        Err(err) => return fail(err),
    };
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
    let rows = match inventory::list(&conn, &filter) {
        Ok(rows) => rows,
        Err(err) => return store_fail(err),
    };
    let summary = match inventory::summary(&conn) {
        Ok(summary) => summary,
        Err(err) => return store_fail(err),
    };
    drop(conn);

    match format {
        ReportFormat::Json => {
            let items: Vec<Value> = rows.iter().map(inventory_json).collect();
            ok(json!({"report": items, "summary": summary, "generatedAt": Utc::now()}))
        }
        ReportFormat::Excel => match inventory_workbook(&rows) {
            Ok(bytes) => xlsx_response(&dated_filename("inventory-report"), bytes),
            Err(err) => workbook_fail(err),
        },
    }
}

pub(crate) async fn transactions_report_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let format = match parse_report_format(&query) {
        Ok(format) => format,
        Err(err) => return fail(err),
    };
    let (start_date, end_date) = match parse_date_range(&query) {
        Ok(range) => range,
        Err(err) => return fail(err),
    };

    let conn = state.db.lock().await;
    let rows = match transactions::report_rows(&conn, start_date, end_date) {
        Ok(rows) => rows,
        Err(err) => return store_fail(err),
    };
    drop(conn);

    match format {
        ReportFormat::Json => {
            let items: Vec<Value> = rows.iter().map(transaction_json).collect();
            ok(json!({
                "report": items,
                "summary": kind_totals(&rows),
                "generatedAt": Utc::now(),
            }))
        }
        ReportFormat::Excel => match transactions_workbook(&rows) {
            Ok(bytes) => xlsx_response(&dated_filename("transactions-report"), bytes),
            Err(err) => workbook_fail(err),
        },
    }
}

/// Per-kind totals for the JSON transaction report.
fn kind_totals(rows: &[TransactionRow]) -> Value {
    let mut summary = serde_json::Map::new();
    for kind in [
        TransactionKind::Inbound,
        TransactionKind::Outbound,
        TransactionKind::Transfer,
        TransactionKind::Adjustment,
    ] {
        let matching: Vec<&TransactionRow> = rows
            .iter()
            .filter(|r| r.transaction.kind == kind)
            .collect();
        let total_quantity: i64 = matching.iter().map(|r| r.transaction.quantity).sum();
        let total_cost: f64 = matching.iter().map(|r| r.transaction.total_cost()).sum();
        summary.insert(
            kind.as_str().to_string(),
            json!({
                "count": matching.len(),
                "totalQuantity": total_quantity,
                "totalCost": total_cost,
            }),
        );
    }
    Value::Object(summary)
}

/// Attachment name carrying the generation date, e.g.
/// `inventory-report-2026-08-29.xlsx`.
fn dated_filename(stem: &str) -> String {
    format!("{stem}-{}.xlsx", Utc::now().format("%Y-%m-%d"))
}

fn xlsx_response(filename: &str, bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

fn workbook_fail(err: XlsxError) -> Response {
    error!(error = %err, "workbook generation failed");
    fail(ApiError::new(
        ApiErrorCode::Internal,
        "report generation failed",
    ))
}

fn inventory_workbook(rows: &[InventoryRow]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet().set_name("Inventory")?;

    let headers = [
        "Product Code",
        "Product Name",
        "Category",
        "Warehouse",
        "Quantity",
        "Reserved",
        "Available",
        "Unit",
        "Min Level",
        "Status",
        "Stock Value",
    ];
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, &row.product_code)?;
        sheet.write_string(r, 1, &row.product_name)?;
        sheet.write_string(r, 2, &row.category_name)?;
        sheet.write_string(r, 3, &row.warehouse_name)?;
        sheet.write_number(r, 4, row.inventory.quantity as f64)?;
        sheet.write_number(r, 5, row.inventory.reserved_quantity as f64)?;
        sheet.write_number(r, 6, row.inventory.available_quantity() as f64)?;
        sheet.write_string(r, 7, &row.product_unit)?;
        sheet.write_number(r, 8, row.min_stock_level as f64)?;
        sheet.write_string(r, 9, if row.is_low_stock() { "Low Stock" } else { "OK" })?;
        sheet.write_number(r, 10, row.stock_value())?;
    }
    workbook.save_to_buffer()
}

fn transactions_workbook(rows: &[TransactionRow]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet().set_name("Transactions")?;

    let headers = [
        "Reference",
        "Type",
        "Date",
        "Product Code",
        "Product Name",
        "Warehouse",
        "Destination",
        "Quantity",
        "Unit Cost",
        "Total Cost",
        "User",
        "Notes",
    ];
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        let t = &row.transaction;
        sheet.write_string(r, 0, &t.reference_number)?;
        sheet.write_string(r, 1, t.kind.as_str())?;
        sheet.write_string(
            r,
            2,
            t.transaction_date
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
        sheet.write_string(r, 3, &row.product_code)?;
        sheet.write_string(r, 4, &row.product_name)?;
        sheet.write_string(r, 5, &row.warehouse_name)?;
        sheet.write_string(
            r,
            6,
            row.destination_warehouse_name.as_deref().unwrap_or(""),
        )?;
        sheet.write_number(r, 7, t.quantity as f64)?;
        sheet.write_number(r, 8, t.unit_cost)?;
        sheet.write_number(r, 9, t.total_cost())?;
        sheet.write_string(r, 10, &row.user_full_name)?;
        sheet.write_string(r, 11, t.notes.as_deref().unwrap_or(""))?;
    }
    workbook.save_to_buffer()
}
