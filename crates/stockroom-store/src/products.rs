// SPDX-License-Identifier: Apache-2.0

//! Product catalog queries. List queries are built dynamically from the
//! caller's filters; every fragment is bound, never interpolated.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use stockroom_model::Product;
use uuid::Uuid;

use crate::{decode_tags, encode_tags, encode_ts, ts_from_sql, uuid_from_sql, Result, StoreError};

const PRODUCT_COLUMNS: &str = "p.id, p.code, p.name, p.description, p.category_id, p.unit, \
     p.unit_price, p.cost_price, p.min_stock_level, p.max_stock_level, p.weight, p.dimensions, \
     p.barcode, p.sku, p.image, p.is_active, p.tags, p.created_at, p.updated_at";

/// Product plus the joined category name, as list and detail endpoints
/// present it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub product: Product,
    pub category_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug)]
pub struct ProductPage {
    pub items: Vec<ProductRow>,
    pub total: usize,
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<ProductRow> {
    let product = Product {
        id: uuid_from_sql(0, &row.get::<_, String>(0)?)?,
        code: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        category_id: uuid_from_sql(4, &row.get::<_, String>(4)?)?,
        unit: row.get(5)?,
        unit_price: row.get(6)?,
        cost_price: row.get(7)?,
        min_stock_level: row.get(8)?,
        max_stock_level: row.get(9)?,
        weight: row.get(10)?,
        dimensions: row.get(11)?,
        barcode: row.get(12)?,
        sku: row.get(13)?,
        image: row.get(14)?,
        is_active: row.get(15)?,
        tags: decode_tags(row.get(16)?),
        created_at: ts_from_sql(17, &row.get::<_, String>(17)?)?,
        updated_at: ts_from_sql(18, &row.get::<_, String>(18)?)?,
    };
    Ok(ProductRow {
        product,
        category_name: row.get(19)?,
    })
}

pub fn insert(conn: &Connection, product: &Product) -> Result<()> {
    require_category(conn, product.category_id)?;
    check_unique(conn, product, None)?;
    conn.execute(
        "INSERT INTO products (id, code, name, description, category_id, unit, unit_price, \
         cost_price, min_stock_level, max_stock_level, weight, dimensions, barcode, sku, image, \
         is_active, tags, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
         ?18, ?19)",
        params![
            product.id.to_string(),
            product.code,
            product.name,
            product.description,
            product.category_id.to_string(),
            product.unit,
            product.unit_price,
            product.cost_price,
            product.min_stock_level,
            product.max_stock_level,
            product.weight,
            product.dimensions,
            product.barcode,
            product.sku,
            product.image,
            product.is_active,
            encode_tags(&product.tags),
            encode_ts(&product.created_at),
            encode_ts(&product.updated_at),
        ],
    )?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: Uuid) -> Result<ProductRow> {
    conn.query_row(
        &format!(
            "SELECT {PRODUCT_COLUMNS}, c.name FROM products p \
             JOIN categories c ON c.id = p.category_id WHERE p.id = ?1"
        ),
        params![id.to_string()],
        product_from_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound("product"))
}

pub fn list(
    conn: &Connection,
    filter: &ProductFilter,
    limit: usize,
    offset: usize,
) -> Result<ProductPage> {
    let (where_sql, filter_params) = build_filter(filter);

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM products p {where_sql}"),
        params_from_iter(filter_params.iter()),
        |r| r.get(0),
    )?;

    let mut page_params = filter_params;
    page_params.push(Value::Integer(limit as i64));
    page_params.push(Value::Integer(offset as i64));
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRODUCT_COLUMNS}, c.name FROM products p \
         JOIN categories c ON c.id = p.category_id {where_sql} \
         ORDER BY p.created_at DESC, p.name LIMIT ? OFFSET ?"
    ))?;
    let items = stmt
        .query_map(params_from_iter(page_params.iter()), product_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(ProductPage {
        items,
        total: total as usize,
    })
}

fn build_filter(filter: &ProductFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();
    if let Some(search) = &filter.search {
        clauses.push(
            "(p.name LIKE ? ESCAPE '!' OR p.code LIKE ? ESCAPE '!' \
             OR p.description LIKE ? ESCAPE '!')",
        );
        let pattern = format!("%{}%", escape_like(search));
        params.push(Value::Text(pattern.clone()));
        params.push(Value::Text(pattern.clone()));
        params.push(Value::Text(pattern));
    }
    if let Some(category_id) = filter.category_id {
        clauses.push("p.category_id = ?");
        params.push(Value::Text(category_id.to_string()));
    }
    if let Some(is_active) = filter.is_active {
        clauses.push("p.is_active = ?");
        params.push(Value::Integer(i64::from(is_active)));
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (where_sql, params)
}

fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '!' | '%' | '_' => {
                out.push('!');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[derive(Default)]
pub struct ProductPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub unit: Option<String>,
    pub unit_price: Option<f64>,
    pub cost_price: Option<f64>,
    pub min_stock_level: Option<i64>,
    pub max_stock_level: Option<i64>,
    pub weight: Option<f64>,
    pub dimensions: Option<String>,
    pub barcode: Option<String>,
    pub sku: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

pub fn update(
    conn: &Connection,
    id: Uuid,
    patch: &ProductPatch,
    now: DateTime<Utc>,
) -> Result<ProductRow> {
    let current = find_by_id(conn, id)?.product;
    let mut next = current.clone();
    if let Some(v) = patch.code.clone() {
        next.code = v;
    }
    if let Some(v) = patch.name.clone() {
        next.name = v;
    }
    if patch.description.is_some() {
        next.description = patch.description.clone();
    }
    if let Some(v) = patch.category_id {
        next.category_id = v;
    }
    if let Some(v) = patch.unit.clone() {
        next.unit = v;
    }
    if let Some(v) = patch.unit_price {
        next.unit_price = v;
    }
    if let Some(v) = patch.cost_price {
        next.cost_price = v;
    }
    if let Some(v) = patch.min_stock_level {
        next.min_stock_level = v;
    }
    if patch.max_stock_level.is_some() {
        next.max_stock_level = patch.max_stock_level;
    }
    if patch.weight.is_some() {
        next.weight = patch.weight;
    }
    if patch.dimensions.is_some() {
        next.dimensions = patch.dimensions.clone();
    }
    if patch.barcode.is_some() {
        next.barcode = patch.barcode.clone();
    }
    if patch.sku.is_some() {
        next.sku = patch.sku.clone();
    }
    if let Some(v) = patch.tags.clone() {
        next.tags = v;
    }
    if let Some(v) = patch.is_active {
        next.is_active = v;
    }
    next.updated_at = now;

    require_category(conn, next.category_id)?;
    check_unique(conn, &next, Some(id))?;
    conn.execute(
        "UPDATE products SET code = ?2, name = ?3, description = ?4, category_id = ?5, \
         unit = ?6, unit_price = ?7, cost_price = ?8, min_stock_level = ?9, \
         max_stock_level = ?10, weight = ?11, dimensions = ?12, barcode = ?13, sku = ?14, \
         tags = ?15, is_active = ?16, updated_at = ?17 WHERE id = ?1",
        params![
            id.to_string(),
            next.code,
            next.name,
            next.description,
            next.category_id.to_string(),
            next.unit,
            next.unit_price,
            next.cost_price,
            next.min_stock_level,
            next.max_stock_level,
            next.weight,
            next.dimensions,
            next.barcode,
            next.sku,
            encode_tags(&next.tags),
            next.is_active,
            encode_ts(&now),
        ],
    )?;
    find_by_id(conn, id)
}

/// Deletion is refused while stock or transaction history references the
/// product. Empty inventory rows are swept along with it.
pub fn delete(conn: &Connection, id: Uuid) -> Result<()> {
    let id_text = id.to_string();
    let stocked: i64 = conn.query_row(
        "SELECT COUNT(*) FROM inventory WHERE product_id = ?1 AND quantity > 0",
        params![id_text],
        |r| r.get(0),
    )?;
    if stocked > 0 {
        return Err(StoreError::Conflict(
            "product still has stock and cannot be deleted".to_string(),
        ));
    }
    let referenced: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE product_id = ?1",
        params![id_text],
        |r| r.get(0),
    )?;
    if referenced > 0 {
        return Err(StoreError::Conflict(
            "product appears in transaction history and cannot be deleted".to_string(),
        ));
    }
    conn.execute("DELETE FROM inventory WHERE product_id = ?1", params![id_text])?;
    let changed = conn.execute("DELETE FROM products WHERE id = ?1", params![id_text])?;
    if changed == 0 {
        return Err(StoreError::NotFound("product"));
    }
    Ok(())
}

fn require_category(conn: &Connection, category_id: Uuid) -> Result<()> {
    let exists: Option<String> = conn
        .query_row(
            "SELECT id FROM categories WHERE id = ?1",
            params![category_id.to_string()],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(StoreError::MissingReference("category"));
    }
    Ok(())
}

fn check_unique(conn: &Connection, product: &Product, exclude: Option<Uuid>) -> Result<()> {
    let exclude = exclude.map(|id| id.to_string()).unwrap_or_default();
    let code_taken: Option<String> = conn
        .query_row(
            "SELECT id FROM products WHERE code = ?1 AND id != ?2 LIMIT 1",
            params![product.code, exclude],
            |r| r.get(0),
        )
        .optional()?;
    if code_taken.is_some() {
        return Err(StoreError::Conflict(
            "product code is already in use".to_string(),
        ));
    }
    for (field, value) in [("barcode", &product.barcode), ("sku", &product.sku)] {
        if let Some(value) = value {
            let taken: Option<String> = conn
                .query_row(
                    &format!("SELECT id FROM products WHERE {field} = ?1 AND id != ?2 LIMIT 1"),
                    params![value, exclude],
                    |r| r.get(0),
                )
                .optional()?;
            if taken.is_some() {
                return Err(StoreError::Conflict(format!(
                    "product {field} is already in use"
                )));
            }
        }
    }
    Ok(())
}
