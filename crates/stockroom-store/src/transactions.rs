// SPDX-License-Identifier: Apache-2.0

//! Stock transaction posting and history.
//!
//! `post_transaction` is the only write path for stock levels. It runs inside
//! an immediate SQLite transaction so the read-check-write sequence on the
//! inventory row cannot interleave with another posting.

use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior,
};
use stockroom_model::{
    reference_number, StockTransaction, TransactionKind, TransactionStatus,
};
use uuid::Uuid;

use tracing::debug;

use crate::{
    encode_opt_ts, encode_ts, opt_ts_from_sql, opt_uuid_from_sql, ts_from_sql, uuid_from_sql,
    Result, StoreError,
};

const TRANSACTION_COLUMNS: &str = "t.id, t.kind, t.reference_number, t.product_id, \
     t.warehouse_id, t.destination_warehouse_id, t.user_id, t.quantity, t.unit_cost, t.reason, \
     t.notes, t.supplier_name, t.supplier_contact, t.customer_name, t.customer_contact, \
     t.batch_number, t.expiry_date, t.transaction_date, t.status, t.created_at, t.updated_at";

const REFERENCE_ATTEMPTS: usize = 5;

/// A requested stock movement, before it has been applied.
#[derive(Debug, Clone)]
pub struct Posting {
    pub kind: TransactionKind,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    /// Transfers only; must differ from `warehouse_id`.
    pub destination_warehouse_id: Option<Uuid>,
    pub user_id: Uuid,
    pub quantity: i64,
    pub unit_cost: f64,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub supplier_name: Option<String>,
    pub supplier_contact: Option<String>,
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub transaction_date: Option<DateTime<Utc>>,
}

impl Posting {
    #[must_use]
    pub fn new(
        kind: TransactionKind,
        product_id: Uuid,
        warehouse_id: Uuid,
        user_id: Uuid,
        quantity: i64,
    ) -> Self {
        Self {
            kind,
            product_id,
            warehouse_id,
            destination_warehouse_id: None,
            user_id,
            quantity,
            unit_cost: 0.0,
            reason: None,
            notes: None,
            supplier_name: None,
            supplier_contact: None,
            customer_name: None,
            customer_contact: None,
            batch_number: None,
            expiry_date: None,
            transaction_date: None,
        }
    }
}

/// Transaction joined with the rows it references, as history endpoints
/// present it.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub transaction: StockTransaction,
    pub product_code: String,
    pub product_name: String,
    pub product_unit: String,
    pub warehouse_name: String,
    pub warehouse_code: String,
    pub destination_warehouse_name: Option<String>,
    pub username: String,
    pub user_full_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    /// Matches the source or, for transfers, the destination side.
    pub warehouse_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct TransactionPage {
    pub items: Vec<TransactionRow>,
    pub total: usize,
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<TransactionRow> {
    let kind_raw: String = row.get(1)?;
    let kind = kind_raw.parse::<TransactionKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let status_raw: String = row.get(18)?;
    let status = status_raw.parse::<TransactionStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(18, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let transaction = StockTransaction {
        id: uuid_from_sql(0, &row.get::<_, String>(0)?)?,
        kind,
        reference_number: row.get(2)?,
        product_id: uuid_from_sql(3, &row.get::<_, String>(3)?)?,
        warehouse_id: uuid_from_sql(4, &row.get::<_, String>(4)?)?,
        destination_warehouse_id: opt_uuid_from_sql(5, row.get(5)?)?,
        user_id: uuid_from_sql(6, &row.get::<_, String>(6)?)?,
        quantity: row.get(7)?,
        unit_cost: row.get(8)?,
        reason: row.get(9)?,
        notes: row.get(10)?,
        supplier_name: row.get(11)?,
        supplier_contact: row.get(12)?,
        customer_name: row.get(13)?,
        customer_contact: row.get(14)?,
        batch_number: row.get(15)?,
        expiry_date: opt_ts_from_sql(16, row.get(16)?)?,
        transaction_date: ts_from_sql(17, &row.get::<_, String>(17)?)?,
        status,
        created_at: ts_from_sql(19, &row.get::<_, String>(19)?)?,
        updated_at: ts_from_sql(20, &row.get::<_, String>(20)?)?,
    };
    let first_name: String = row.get(28)?;
    let last_name: String = row.get(29)?;
    Ok(TransactionRow {
        transaction,
        product_code: row.get(21)?,
        product_name: row.get(22)?,
        product_unit: row.get(23)?,
        warehouse_name: row.get(24)?,
        warehouse_code: row.get(25)?,
        destination_warehouse_name: row.get(26)?,
        username: row.get(27)?,
        user_full_name: format!("{first_name} {last_name}"),
    })
}

fn joined_select(where_sql: &str, tail: &str) -> String {
    format!(
        "SELECT {TRANSACTION_COLUMNS}, p.code, p.name, p.unit, w.name, w.code, dw.name, \
         u.username, u.first_name, u.last_name \
         FROM transactions t \
         JOIN products p ON p.id = t.product_id \
         JOIN warehouses w ON w.id = t.warehouse_id \
         LEFT JOIN warehouses dw ON dw.id = t.destination_warehouse_id \
         JOIN users u ON u.id = t.user_id \
         {where_sql} {tail}"
    )
}

/// Applies a stock movement and records it, atomically.
///
/// Inbound adds to the warehouse, outbound removes (refusing to go below
/// zero), adjustment sets the absolute level, and transfer moves stock from
/// the source warehouse to the destination.
pub fn post_transaction(conn: &mut Connection, posting: &Posting) -> Result<TransactionRow> {
    validate_posting(posting)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    require_row(&tx, "products", "product", posting.product_id)?;
    require_row(&tx, "warehouses", "warehouse", posting.warehouse_id)?;
    if let Some(destination) = posting.destination_warehouse_id {
        require_row(&tx, "warehouses", "destination warehouse", destination)?;
    }

    let now = Utc::now();
    match posting.kind {
        TransactionKind::Inbound => {
            add_stock(&tx, posting.product_id, posting.warehouse_id, posting.quantity, now)?;
        }
        TransactionKind::Outbound => {
            remove_stock(&tx, posting.product_id, posting.warehouse_id, posting.quantity, now)?;
        }
        TransactionKind::Adjustment => {
            set_stock(&tx, posting.product_id, posting.warehouse_id, posting.quantity, now)?;
        }
        TransactionKind::Transfer => {
            let destination = posting
                .destination_warehouse_id
                .ok_or_else(|| transfer_needs_destination())?;
            remove_stock(&tx, posting.product_id, posting.warehouse_id, posting.quantity, now)?;
            add_stock(&tx, posting.product_id, destination, posting.quantity, now)?;
        }
    }

    let id = Uuid::new_v4();
    let reference = free_reference(&tx, posting.kind, now)?;
    let transaction_date = posting.transaction_date.unwrap_or(now);
    tx.execute(
        "INSERT INTO transactions (id, kind, reference_number, product_id, warehouse_id, \
         destination_warehouse_id, user_id, quantity, unit_cost, reason, notes, supplier_name, \
         supplier_contact, customer_name, customer_contact, batch_number, expiry_date, \
         transaction_date, status, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
         ?18, ?19, ?20, ?21)",
        params![
            id.to_string(),
            posting.kind.as_str(),
            reference,
            posting.product_id.to_string(),
            posting.warehouse_id.to_string(),
            posting.destination_warehouse_id.map(|v| v.to_string()),
            posting.user_id.to_string(),
            posting.quantity,
            posting.unit_cost,
            posting.reason,
            posting.notes,
            posting.supplier_name,
            posting.supplier_contact,
            posting.customer_name,
            posting.customer_contact,
            posting.batch_number,
            encode_opt_ts(&posting.expiry_date),
            encode_ts(&transaction_date),
            TransactionStatus::Completed.as_str(),
            encode_ts(&now),
            encode_ts(&now),
        ],
    )?;

    let row = tx
        .query_row(
            &joined_select("WHERE t.id = ?1", ""),
            params![id.to_string()],
            transaction_from_row,
        )?;
    tx.commit()?;
    debug!(
        kind = posting.kind.as_str(),
        reference = row.transaction.reference_number.as_str(),
        quantity = posting.quantity,
        "posted stock transaction"
    );
    Ok(row)
}

pub fn find_by_id(conn: &Connection, id: Uuid) -> Result<TransactionRow> {
    conn.query_row(
        &joined_select("WHERE t.id = ?1", ""),
        params![id.to_string()],
        transaction_from_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound("transaction"))
}

pub fn list(
    conn: &Connection,
    filter: &TransactionFilter,
    limit: usize,
    offset: usize,
) -> Result<TransactionPage> {
    let (where_sql, filter_params) = build_filter(filter);

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM transactions t {where_sql}"),
        params_from_iter(filter_params.iter()),
        |r| r.get(0),
    )?;

    let mut page_params = filter_params;
    page_params.push(Value::Integer(limit as i64));
    page_params.push(Value::Integer(offset as i64));
    let mut stmt = conn.prepare(&joined_select(
        &where_sql,
        "ORDER BY t.transaction_date DESC, t.created_at DESC LIMIT ? OFFSET ?",
    ))?;
    let items = stmt
        .query_map(params_from_iter(page_params.iter()), transaction_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(TransactionPage {
        items,
        total: total as usize,
    })
}

/// Unpaged history for report generation, oldest first.
pub fn report_rows(
    conn: &Connection,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<Vec<TransactionRow>> {
    let filter = TransactionFilter {
        start_date,
        end_date,
        ..TransactionFilter::default()
    };
    let (where_sql, params) = build_filter(&filter);
    let mut stmt = conn.prepare(&joined_select(
        &where_sql,
        "ORDER BY t.transaction_date, t.created_at",
    ))?;
    let rows = stmt.query_map(params_from_iter(params.iter()), transaction_from_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StoreError::from)
}

fn build_filter(filter: &TransactionFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();
    if let Some(kind) = filter.kind {
        clauses.push("t.kind = ?");
        params.push(Value::Text(kind.as_str().to_string()));
    }
    if let Some(warehouse_id) = filter.warehouse_id {
        clauses.push("(t.warehouse_id = ? OR t.destination_warehouse_id = ?)");
        params.push(Value::Text(warehouse_id.to_string()));
        params.push(Value::Text(warehouse_id.to_string()));
    }
    if let Some(product_id) = filter.product_id {
        clauses.push("t.product_id = ?");
        params.push(Value::Text(product_id.to_string()));
    }
    if let Some(start) = filter.start_date {
        clauses.push("t.transaction_date >= ?");
        params.push(Value::Text(encode_ts(&start)));
    }
    if let Some(end) = filter.end_date {
        clauses.push("t.transaction_date <= ?");
        params.push(Value::Text(encode_ts(&end)));
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (where_sql, params)
}

fn validate_posting(posting: &Posting) -> Result<()> {
    if posting.quantity < 1 {
        return Err(StoreError::InvalidPosting(
            "quantity must be at least 1".to_string(),
        ));
    }
    if !posting.unit_cost.is_finite() || posting.unit_cost < 0.0 {
        return Err(StoreError::InvalidPosting(
            "unitCost must be >= 0".to_string(),
        ));
    }
    match (posting.kind, posting.destination_warehouse_id) {
        (TransactionKind::Transfer, None) => Err(transfer_needs_destination()),
        (TransactionKind::Transfer, Some(destination))
            if destination == posting.warehouse_id =>
        {
            Err(StoreError::InvalidPosting(
                "transfer destination must differ from the source warehouse".to_string(),
            ))
        }
        (TransactionKind::Transfer, Some(_)) => Ok(()),
        (_, Some(_)) => Err(StoreError::InvalidPosting(
            "destinationWarehouseId is only valid for transfers".to_string(),
        )),
        (_, None) => Ok(()),
    }
}

fn transfer_needs_destination() -> StoreError {
    StoreError::InvalidPosting("transfer requires destinationWarehouseId".to_string())
}

fn require_row(conn: &Connection, table: &str, what: &'static str, id: Uuid) -> Result<()> {
    let exists: Option<String> = conn
        .query_row(
            &format!("SELECT id FROM {table} WHERE id = ?1"),
            params![id.to_string()],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(StoreError::MissingReference(what));
    }
    Ok(())
}

fn current_quantity(
    conn: &Connection,
    product_id: Uuid,
    warehouse_id: Uuid,
) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT quantity FROM inventory WHERE product_id = ?1 AND warehouse_id = ?2",
        params![product_id.to_string(), warehouse_id.to_string()],
        |r| r.get(0),
    )
    .optional()
    .map_err(StoreError::from)
}

fn write_quantity(
    conn: &Connection,
    product_id: Uuid,
    warehouse_id: Uuid,
    exists: bool,
    quantity: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    if exists {
        conn.execute(
            "UPDATE inventory SET quantity = ?3, updated_at = ?4 \
             WHERE product_id = ?1 AND warehouse_id = ?2",
            params![
                product_id.to_string(),
                warehouse_id.to_string(),
                quantity,
                encode_ts(&now)
            ],
        )?;
    } else {
        conn.execute(
            "INSERT INTO inventory (id, product_id, warehouse_id, quantity, reserved_quantity, \
             created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
            params![
                Uuid::new_v4().to_string(),
                product_id.to_string(),
                warehouse_id.to_string(),
                quantity,
                encode_ts(&now)
            ],
        )?;
    }
    Ok(())
}

fn add_stock(
    conn: &Connection,
    product_id: Uuid,
    warehouse_id: Uuid,
    quantity: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    let current = current_quantity(conn, product_id, warehouse_id)?;
    let next = current.unwrap_or(0).saturating_add(quantity);
    write_quantity(conn, product_id, warehouse_id, current.is_some(), next, now)
}

fn remove_stock(
    conn: &Connection,
    product_id: Uuid,
    warehouse_id: Uuid,
    quantity: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    let current = current_quantity(conn, product_id, warehouse_id)?;
    let available = current.unwrap_or(0);
    if available < quantity {
        return Err(StoreError::InsufficientStock {
            available,
            requested: quantity,
        });
    }
    write_quantity(
        conn,
        product_id,
        warehouse_id,
        current.is_some(),
        available - quantity,
        now,
    )
}

fn set_stock(
    conn: &Connection,
    product_id: Uuid,
    warehouse_id: Uuid,
    quantity: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    let current = current_quantity(conn, product_id, warehouse_id)?;
    write_quantity(conn, product_id, warehouse_id, current.is_some(), quantity, now)
}

/// Picks an unused reference number. The suffix is random, so a collision
/// means retrying with a fresh one; after `REFERENCE_ATTEMPTS` misses the
/// posting fails rather than looping.
fn free_reference(
    conn: &Connection,
    kind: TransactionKind,
    now: DateTime<Utc>,
) -> Result<String> {
    let mut rng = rand::thread_rng();
    for _ in 0..REFERENCE_ATTEMPTS {
        let candidate = reference_number(kind, now, rng.gen_range(0..1_000_000));
        let taken: Option<String> = conn
            .query_row(
                "SELECT id FROM transactions WHERE reference_number = ?1",
                params![candidate],
                |r| r.get(0),
            )
            .optional()?;
        if taken.is_none() {
            return Ok(candidate);
        }
    }
    Err(StoreError::Conflict(
        "could not allocate a unique reference number".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::tests::sample_category;
    use crate::inventory::quantity_at;
    use crate::products::tests::sample_product;
    use crate::users::tests::sample_user;
    use crate::warehouses::tests::sample_warehouse;
    use crate::open_in_memory;

    struct Fixture {
        conn: Connection,
        product_id: Uuid,
        warehouse_id: Uuid,
        second_warehouse_id: Uuid,
        user_id: Uuid,
    }

    fn fixture() -> Fixture {
        let conn = open_in_memory().expect("open");
        let category = sample_category("Electronics");
        crate::categories::insert(&conn, &category).expect("category");
        let product = sample_product("LT1", "Laptop", category.id);
        crate::products::insert(&conn, &product).expect("product");
        let warehouse = sample_warehouse("Main", "MW01");
        crate::warehouses::insert(&conn, &warehouse).expect("warehouse");
        let second = sample_warehouse("Backup", "BW01");
        crate::warehouses::insert(&conn, &second).expect("second warehouse");
        let user = sample_user("clerk", "clerk@example.com");
        crate::users::insert(&conn, &user).expect("user");
        Fixture {
            conn,
            product_id: product.id,
            warehouse_id: warehouse.id,
            second_warehouse_id: second.id,
            user_id: user.id,
        }
    }

    fn posting(fx: &Fixture, kind: TransactionKind, quantity: i64) -> Posting {
        Posting::new(kind, fx.product_id, fx.warehouse_id, fx.user_id, quantity)
    }

    #[test]
    fn inbound_creates_and_accumulates_stock() {
        let mut fx = fixture();
        let first = posting(&fx, TransactionKind::Inbound, 10);
        let row = post_transaction(&mut fx.conn, &first).expect("first inbound");
        assert_eq!(row.transaction.kind, TransactionKind::Inbound);
        assert_eq!(row.product_code, "LT1");
        assert_eq!(row.warehouse_code, "MW01");
        assert_eq!(row.username, "clerk");
        assert!(row.transaction.reference_number.starts_with("INBOUND-"));

        let second = posting(&fx, TransactionKind::Inbound, 5);
        post_transaction(&mut fx.conn, &second).expect("second inbound");
        assert_eq!(
            quantity_at(&fx.conn, fx.product_id, fx.warehouse_id).expect("quantity"),
            15
        );
    }

    #[test]
    fn outbound_rejects_insufficient_stock_without_side_effects() {
        let mut fx = fixture();
        let inbound = posting(&fx, TransactionKind::Inbound, 3);
        post_transaction(&mut fx.conn, &inbound).expect("inbound");

        let outbound = posting(&fx, TransactionKind::Outbound, 5);
        let err = post_transaction(&mut fx.conn, &outbound).expect_err("insufficient");
        assert!(matches!(
            err,
            StoreError::InsufficientStock {
                available: 3,
                requested: 5
            }
        ));
        // Nothing moved and nothing was recorded.
        assert_eq!(
            quantity_at(&fx.conn, fx.product_id, fx.warehouse_id).expect("quantity"),
            3
        );
        let page = list(&fx.conn, &TransactionFilter::default(), 100, 0).expect("list");
        assert_eq!(page.total, 1);
    }

    #[test]
    fn outbound_from_empty_warehouse_reports_zero_available() {
        let mut fx = fixture();
        let outbound = posting(&fx, TransactionKind::Outbound, 1);
        let err = post_transaction(&mut fx.conn, &outbound).expect_err("empty");
        assert!(matches!(
            err,
            StoreError::InsufficientStock {
                available: 0,
                requested: 1
            }
        ));
    }

    #[test]
    fn adjustment_sets_the_absolute_level() {
        let mut fx = fixture();
        let inbound = posting(&fx, TransactionKind::Inbound, 10);
        post_transaction(&mut fx.conn, &inbound).expect("inbound");
        let adjust = posting(&fx, TransactionKind::Adjustment, 4);
        post_transaction(&mut fx.conn, &adjust).expect("adjust");
        assert_eq!(
            quantity_at(&fx.conn, fx.product_id, fx.warehouse_id).expect("quantity"),
            4
        );
    }

    #[test]
    fn transfer_moves_stock_between_warehouses() {
        let mut fx = fixture();
        let inbound = posting(&fx, TransactionKind::Inbound, 10);
        post_transaction(&mut fx.conn, &inbound).expect("inbound");

        let mut transfer = posting(&fx, TransactionKind::Transfer, 4);
        transfer.destination_warehouse_id = Some(fx.second_warehouse_id);
        let row = post_transaction(&mut fx.conn, &transfer).expect("transfer");
        assert_eq!(row.destination_warehouse_name.as_deref(), Some("Backup"));

        assert_eq!(
            quantity_at(&fx.conn, fx.product_id, fx.warehouse_id).expect("source"),
            6
        );
        assert_eq!(
            quantity_at(&fx.conn, fx.product_id, fx.second_warehouse_id).expect("destination"),
            4
        );
    }

    #[test]
    fn transfer_validation() {
        let mut fx = fixture();
        let inbound = posting(&fx, TransactionKind::Inbound, 10);
        post_transaction(&mut fx.conn, &inbound).expect("inbound");

        let missing = posting(&fx, TransactionKind::Transfer, 1);
        assert!(matches!(
            post_transaction(&mut fx.conn, &missing),
            Err(StoreError::InvalidPosting(_))
        ));

        let mut same = posting(&fx, TransactionKind::Transfer, 1);
        same.destination_warehouse_id = Some(fx.warehouse_id);
        assert!(matches!(
            post_transaction(&mut fx.conn, &same),
            Err(StoreError::InvalidPosting(_))
        ));

        let mut inbound = posting(&fx, TransactionKind::Inbound, 1);
        inbound.destination_warehouse_id = Some(fx.second_warehouse_id);
        assert!(matches!(
            post_transaction(&mut fx.conn, &inbound),
            Err(StoreError::InvalidPosting(_))
        ));
    }

    #[test]
    fn unknown_references_are_rejected() {
        let mut fx = fixture();
        let mut bad_product = posting(&fx, TransactionKind::Inbound, 1);
        bad_product.product_id = Uuid::new_v4();
        assert!(matches!(
            post_transaction(&mut fx.conn, &bad_product),
            Err(StoreError::MissingReference("product"))
        ));

        let mut bad_warehouse = posting(&fx, TransactionKind::Inbound, 1);
        bad_warehouse.warehouse_id = Uuid::new_v4();
        assert!(matches!(
            post_transaction(&mut fx.conn, &bad_warehouse),
            Err(StoreError::MissingReference("warehouse"))
        ));
    }

    #[test]
    fn zero_quantity_is_invalid() {
        let mut fx = fixture();
        let zero = posting(&fx, TransactionKind::Inbound, 0);
        assert!(matches!(
            post_transaction(&mut fx.conn, &zero),
            Err(StoreError::InvalidPosting(_))
        ));
    }

    #[test]
    fn list_filters_by_kind_and_warehouse() {
        let mut fx = fixture();
        let inbound = posting(&fx, TransactionKind::Inbound, 10);
        post_transaction(&mut fx.conn, &inbound).expect("inbound");
        let outbound = posting(&fx, TransactionKind::Outbound, 2);
        post_transaction(&mut fx.conn, &outbound).expect("outbound");
        let mut transfer = posting(&fx, TransactionKind::Transfer, 3);
        transfer.destination_warehouse_id = Some(fx.second_warehouse_id);
        post_transaction(&mut fx.conn, &transfer).expect("transfer");

        let page = list(
            &fx.conn,
            &TransactionFilter {
                kind: Some(TransactionKind::Outbound),
                ..TransactionFilter::default()
            },
            100,
            0,
        )
        .expect("by kind");
        assert_eq!(page.total, 1);

        // The transfer shows up on its destination warehouse too.
        let page = list(
            &fx.conn,
            &TransactionFilter {
                warehouse_id: Some(fx.second_warehouse_id),
                ..TransactionFilter::default()
            },
            100,
            0,
        )
        .expect("by warehouse");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].transaction.kind, TransactionKind::Transfer);
    }

    #[test]
    fn date_filters_bound_the_history() {
        let mut fx = fixture();
        let mut dated = posting(&fx, TransactionKind::Inbound, 1);
        dated.transaction_date = Some("2026-01-15T00:00:00Z".parse().expect("date"));
        post_transaction(&mut fx.conn, &dated).expect("dated");
        let fresh = posting(&fx, TransactionKind::Inbound, 1);
        post_transaction(&mut fx.conn, &fresh).expect("now");

        let page = list(
            &fx.conn,
            &TransactionFilter {
                start_date: Some("2026-01-01T00:00:00Z".parse().expect("start")),
                end_date: Some("2026-02-01T00:00:00Z".parse().expect("end")),
                ..TransactionFilter::default()
            },
            100,
            0,
        )
        .expect("range");
        assert_eq!(page.total, 1);
    }

    #[test]
    fn report_rows_are_oldest_first() {
        let mut fx = fixture();
        let mut older = posting(&fx, TransactionKind::Inbound, 1);
        older.transaction_date = Some("2026-01-15T00:00:00Z".parse().expect("date"));
        post_transaction(&mut fx.conn, &older).expect("older");
        let newer = posting(&fx, TransactionKind::Outbound, 1);
        post_transaction(&mut fx.conn, &newer).expect("newer");

        let rows = report_rows(&fx.conn, None, None).expect("rows");
        assert_eq!(rows.len(), 2);
        assert!(rows[0].transaction.transaction_date <= rows[1].transaction.transaction_date);
    }
}
