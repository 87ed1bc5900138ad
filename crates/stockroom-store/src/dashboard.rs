//! Aggregate queries behind the dashboard endpoints.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::{encode_ts, Result, StoreError};

/// Headline counters for the dashboard stats card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_warehouses: i64,
    pub total_categories: i64,
    pub total_users: i64,
    pub total_stock_quantity: i64,
    pub total_stock_value: f64,
    pub low_stock_count: i64,
    pub transactions_today: i64,
}

/// One (day, kind) bucket of the transaction trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: String,
    pub kind: String,
    pub count: i64,
    pub total_quantity: i64,
}

/// Per-kind movement counts over a trailing window, for the overview card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementCounts {
    pub inbound_count: i64,
    pub outbound_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySlice {
    pub category: String,
    pub product_count: i64,
    pub stock_quantity: i64,
    pub stock_value: f64,
}

pub fn stats(conn: &Connection, now: DateTime<Utc>) -> Result<DashboardStats> {
    let count = |sql: &str| -> Result<i64> {
        conn.query_row(sql, [], |r| r.get(0)).map_err(StoreError::from)
    };
    let total_products = count("SELECT COUNT(*) FROM products WHERE is_active = 1")?;
    let total_warehouses = count("SELECT COUNT(*) FROM warehouses WHERE is_active = 1")?;
    let total_categories = count("SELECT COUNT(*) FROM categories WHERE is_active = 1")?;
    let total_users = count("SELECT COUNT(*) FROM users WHERE is_active = 1")?;

    let (total_stock_quantity, total_stock_value, low_stock_count) = conn.query_row(
        "SELECT COALESCE(SUM(i.quantity), 0), COALESCE(SUM(i.quantity * p.cost_price), 0.0), \
         COALESCE(SUM(i.quantity <= p.min_stock_level), 0) \
         FROM inventory i JOIN products p ON p.id = i.product_id",
        [],
        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )?;

    // RFC 3339 text sorts chronologically, so a prefix range covers the day.
    let day_start = format!("{}T00:00:00.000Z", now.format("%Y-%m-%d"));
    let transactions_today = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE transaction_date >= ?1",
        params![day_start],
        |r| r.get(0),
    )?;

    Ok(DashboardStats {
        total_products,
        total_warehouses,
        total_categories,
        total_users,
        total_stock_quantity,
        total_stock_value,
        low_stock_count,
        transactions_today,
    })
}

pub fn movement_counts(conn: &Connection, since: DateTime<Utc>) -> Result<MovementCounts> {
    conn.query_row(
        "SELECT COALESCE(SUM(kind = 'inbound'), 0), COALESCE(SUM(kind = 'outbound'), 0) \
         FROM transactions WHERE transaction_date >= ?1",
        params![encode_ts(&since)],
        |r| {
            Ok(MovementCounts {
                inbound_count: r.get(0)?,
                outbound_count: r.get(1)?,
            })
        },
    )
    .map_err(StoreError::from)
}

/// Daily transaction buckets for the trailing `days` window, oldest first.
pub fn trends(conn: &Connection, now: DateTime<Utc>, days: i64) -> Result<Vec<TrendPoint>> {
    let since = now - Duration::days(days);
    let mut stmt = conn.prepare(
        "SELECT substr(transaction_date, 1, 10) AS day, kind, COUNT(*), SUM(quantity) \
         FROM transactions WHERE transaction_date >= ?1 \
         GROUP BY day, kind ORDER BY day, kind",
    )?;
    let rows = stmt.query_map(params![encode_ts(&since)], |r| {
        Ok(TrendPoint {
            date: r.get(0)?,
            kind: r.get(1)?,
            count: r.get(2)?,
            total_quantity: r.get(3)?,
        })
    })?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StoreError::from)
}

/// Product count and held stock per category, largest stock value first.
pub fn category_distribution(conn: &Connection) -> Result<Vec<CategorySlice>> {
    let mut stmt = conn.prepare(
        "SELECT c.name, COUNT(DISTINCT p.id), COALESCE(SUM(i.quantity), 0), \
         COALESCE(SUM(i.quantity * p.cost_price), 0.0) \
         FROM categories c \
         LEFT JOIN products p ON p.category_id = c.id \
         LEFT JOIN inventory i ON i.product_id = p.id \
         GROUP BY c.id ORDER BY 4 DESC, c.name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(CategorySlice {
            category: r.get(0)?,
            product_count: r.get(1)?,
            stock_quantity: r.get(2)?,
            stock_value: r.get(3)?,
        })
    })?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StoreError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::tests::sample_category;
    use crate::products::tests::sample_product;
    use crate::transactions::{post_transaction, Posting, TransactionFilter};
    use crate::users::tests::sample_user;
    use crate::warehouses::tests::sample_warehouse;
    use crate::open_in_memory;
    use stockroom_model::TransactionKind;

    fn seeded() -> Connection {
        let mut conn = open_in_memory().expect("open");
        let category = sample_category("Electronics");
        crate::categories::insert(&conn, &category).expect("category");
        let empty = sample_category("Apparel");
        crate::categories::insert(&conn, &empty).expect("empty category");
        let product = sample_product("LT1", "Laptop", category.id);
        crate::products::insert(&conn, &product).expect("product");
        let warehouse = sample_warehouse("Main", "MW01");
        crate::warehouses::insert(&conn, &warehouse).expect("warehouse");
        let user = sample_user("clerk", "clerk@example.com");
        crate::users::insert(&conn, &user).expect("user");
        post_transaction(
            &mut conn,
            &Posting::new(TransactionKind::Inbound, product.id, warehouse.id, user.id, 8),
        )
        .expect("inbound");
        conn
    }

    #[test]
    fn stats_count_entities_and_todays_activity() {
        let conn = seeded();
        let s = stats(&conn, Utc::now()).expect("stats");
        assert_eq!(s.total_products, 1);
        assert_eq!(s.total_warehouses, 1);
        assert_eq!(s.total_categories, 2);
        assert_eq!(s.total_users, 1);
        assert_eq!(s.total_stock_quantity, 8);
        assert_eq!(s.transactions_today, 1);
        // 8 units at cost 7.5, above the min level of 5.
        assert!((s.total_stock_value - 60.0).abs() < 1e-9);
        assert_eq!(s.low_stock_count, 0);
    }

    #[test]
    fn trends_bucket_by_day_and_kind() {
        let conn = seeded();
        let points = trends(&conn, Utc::now(), 30).expect("trends");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].kind, "inbound");
        assert_eq!(points[0].count, 1);
        assert_eq!(points[0].total_quantity, 8);
        assert_eq!(points[0].date.len(), 10);
    }

    #[test]
    fn movement_counts_ignore_transactions_outside_the_window() {
        let mut conn = seeded();
        let page = crate::transactions::list(&conn, &TransactionFilter::default(), 10, 0)
            .expect("history");
        let seen = &page.items[0].transaction;
        let (product_id, warehouse_id, user_id) = (seen.product_id, seen.warehouse_id, seen.user_id);

        let outbound = Posting::new(TransactionKind::Outbound, product_id, warehouse_id, user_id, 2);
        post_transaction(&mut conn, &outbound).expect("outbound");
        let mut stale = Posting::new(TransactionKind::Inbound, product_id, warehouse_id, user_id, 1);
        stale.transaction_date = Some("2020-01-01T00:00:00Z".parse().expect("date"));
        post_transaction(&mut conn, &stale).expect("stale inbound");

        let counts =
            movement_counts(&conn, Utc::now() - Duration::days(30)).expect("counts");
        assert_eq!(counts.inbound_count, 1);
        assert_eq!(counts.outbound_count, 1);
    }

    #[test]
    fn category_distribution_includes_empty_categories() {
        let conn = seeded();
        let slices = category_distribution(&conn).expect("distribution");
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].category, "Electronics");
        assert_eq!(slices[0].product_count, 1);
        assert_eq!(slices[0].stock_quantity, 8);
        let empty = &slices[1];
        assert_eq!(empty.category, "Apparel");
        assert_eq!(empty.product_count, 0);
        assert_eq!(empty.stock_quantity, 0);
    }
}
