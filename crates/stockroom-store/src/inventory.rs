//! Read side of stock levels. Mutation happens only through the posting
//! engine in `transactions`.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::Serialize;
use stockroom_model::Inventory;
use uuid::Uuid;

use crate::{opt_ts_from_sql, ts_from_sql, uuid_from_sql, Result, StoreError};

const INVENTORY_COLUMNS: &str = "i.id, i.product_id, i.warehouse_id, i.quantity, \
     i.reserved_quantity, i.location, i.last_count_date, i.notes, i.created_at, i.updated_at";

/// Inventory row joined with the product and warehouse it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRow {
    pub inventory: Inventory,
    pub product_code: String,
    pub product_name: String,
    pub product_unit: String,
    pub min_stock_level: i64,
    pub cost_price: f64,
    pub category_name: String,
    pub warehouse_name: String,
    pub warehouse_code: String,
}

impl InventoryRow {
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        self.inventory.quantity <= self.min_stock_level
    }

    #[must_use]
    pub fn stock_value(&self) -> f64 {
        self.inventory.quantity as f64 * self.cost_price
    }
}

#[derive(Debug, Clone, Default)]
pub struct InventoryFilter {
    pub warehouse_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub low_stock: bool,
}

/// Aggregate figures for the inventory summary endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub total_items: i64,
    pub total_quantity: i64,
    pub total_value: f64,
    pub low_stock_count: i64,
}

fn inventory_from_row(row: &Row<'_>) -> rusqlite::Result<InventoryRow> {
    let inventory = Inventory {
        id: uuid_from_sql(0, &row.get::<_, String>(0)?)?,
        product_id: uuid_from_sql(1, &row.get::<_, String>(1)?)?,
        warehouse_id: uuid_from_sql(2, &row.get::<_, String>(2)?)?,
        quantity: row.get(3)?,
        reserved_quantity: row.get(4)?,
        location: row.get(5)?,
        last_count_date: opt_ts_from_sql(6, row.get(6)?)?,
        notes: row.get(7)?,
        created_at: ts_from_sql(8, &row.get::<_, String>(8)?)?,
        updated_at: ts_from_sql(9, &row.get::<_, String>(9)?)?,
    };
    Ok(InventoryRow {
        inventory,
        product_code: row.get(10)?,
        product_name: row.get(11)?,
        product_unit: row.get(12)?,
        min_stock_level: row.get(13)?,
        cost_price: row.get(14)?,
        category_name: row.get(15)?,
        warehouse_name: row.get(16)?,
        warehouse_code: row.get(17)?,
    })
}

fn base_select(where_sql: &str, tail: &str) -> String {
    format!(
        "SELECT {INVENTORY_COLUMNS}, p.code, p.name, p.unit, p.min_stock_level, p.cost_price, \
         c.name, w.name, w.code \
         FROM inventory i \
         JOIN products p ON p.id = i.product_id \
         JOIN categories c ON c.id = p.category_id \
         JOIN warehouses w ON w.id = i.warehouse_id \
         {where_sql} {tail}"
    )
}

pub fn list(conn: &Connection, filter: &InventoryFilter) -> Result<Vec<InventoryRow>> {
    let (where_sql, params) = build_filter(filter);
    let mut stmt = conn.prepare(&base_select(&where_sql, "ORDER BY i.updated_at DESC"))?;
    let rows = stmt.query_map(params_from_iter(params.iter()), inventory_from_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StoreError::from)
}

/// Stock rows for one product across warehouses, for the product detail view.
pub fn list_for_product(conn: &Connection, product_id: Uuid) -> Result<Vec<InventoryRow>> {
    list(
        conn,
        &InventoryFilter {
            product_id: Some(product_id),
            ..InventoryFilter::default()
        },
    )
}

pub fn low_stock(conn: &Connection) -> Result<Vec<InventoryRow>> {
    list(
        conn,
        &InventoryFilter {
            low_stock: true,
            ..InventoryFilter::default()
        },
    )
}

pub fn summary(conn: &Connection) -> Result<InventorySummary> {
    conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(i.quantity), 0), \
         COALESCE(SUM(i.quantity * p.cost_price), 0.0), \
         COALESCE(SUM(i.quantity <= p.min_stock_level), 0) \
         FROM inventory i JOIN products p ON p.id = i.product_id",
        [],
        |r| {
            Ok(InventorySummary {
                total_items: r.get(0)?,
                total_quantity: r.get(1)?,
                total_value: r.get(2)?,
                low_stock_count: r.get(3)?,
            })
        },
    )
    .map_err(StoreError::from)
}

pub fn quantity_at(conn: &Connection, product_id: Uuid, warehouse_id: Uuid) -> Result<i64> {
    conn.query_row(
        "SELECT COALESCE((SELECT quantity FROM inventory \
         WHERE product_id = ?1 AND warehouse_id = ?2), 0)",
        params![product_id.to_string(), warehouse_id.to_string()],
        |r| r.get(0),
    )
    .map_err(StoreError::from)
}

fn build_filter(filter: &InventoryFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();
    if let Some(warehouse_id) = filter.warehouse_id {
        clauses.push("i.warehouse_id = ?");
        params.push(Value::Text(warehouse_id.to_string()));
    }
    if let Some(product_id) = filter.product_id {
        clauses.push("i.product_id = ?");
        params.push(Value::Text(product_id.to_string()));
    }
    if let Some(category_id) = filter.category_id {
        clauses.push("p.category_id = ?");
        params.push(Value::Text(category_id.to_string()));
    }
    if filter.low_stock {
        clauses.push("i.quantity <= p.min_stock_level");
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (where_sql, params)
}
