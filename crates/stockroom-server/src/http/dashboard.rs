use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::response::Response;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use stockroom_api::parse_trend_days;
use stockroom_store::dashboard;
use stockroom_store::transactions;
use stockroom_store::transactions::TransactionFilter;

use crate::http::{fail, ok, store_fail, transaction_json};
use crate::AppState;

const RECENT_TRANSACTIONS: usize = 10;
const OVERVIEW_WINDOW_DAYS: i64 = 30;

/// Headline stats plus recent activity over the trailing 30 days.
pub(crate) async fn overview_handler(State(state): State<AppState>) -> Response {
    let now = Utc::now();
    let since = now - Duration::days(OVERVIEW_WINDOW_DAYS);
    let conn = state.db.lock().await;
    let stats = match dashboard::stats(&conn, now) {
        Ok(stats) => stats,
        Err(err) => return store_fail(err),
    };
    let counts = match dashboard::movement_counts(&conn, since) {
        Ok(counts) => counts,
        Err(err) => return store_fail(err),
    };
    let window = TransactionFilter {
        start_date: Some(since),
        ..TransactionFilter::default()
    };
    match transactions::list(&conn, &window, RECENT_TRANSACTIONS, 0) {
        Ok(recent) => {
            let recent: Vec<Value> = recent.items.iter().map(transaction_json).collect();
            ok(json!({
                "stats": stats,
                "inboundCount": counts.inbound_count,
                "outboundCount": counts.outbound_count,
                "recentTransactions": recent,
            }))
        }
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn trends_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let days = match parse_trend_days(&query) {
        Ok(days) => days,
        Err(err) => return fail(err),
    };
    let conn = state.db.lock().await;
    match dashboard::trends(&conn, Utc::now(), days) {
        Ok(points) => ok(json!({"days": days, "trends": points})),
        Err(err) => store_fail(err),
    }
}

pub(crate) async fn category_distribution_handler(State(state): State<AppState>) -> Response {
    let conn = state.db.lock().await;
    match dashboard::category_distribution(&conn) {
        Ok(slices) => ok(json!({"distribution": slices})),
        Err(err) => store_fail(err),
    }
}
