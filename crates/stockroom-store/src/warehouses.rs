// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use stockroom_model::Warehouse;
use uuid::Uuid;

use crate::{encode_ts, ts_from_sql, uuid_from_sql, Result, StoreError};

const WAREHOUSE_COLUMNS: &str = "id, name, code, address, city, state, postal_code, country, \
     phone, email, manager_name, capacity, is_active, created_at, updated_at";

fn warehouse_from_row(row: &Row<'_>) -> rusqlite::Result<Warehouse> {
    Ok(Warehouse {
        id: uuid_from_sql(0, &row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        code: row.get(2)?,
        address: row.get(3)?,
        city: row.get(4)?,
        state: row.get(5)?,
        postal_code: row.get(6)?,
        country: row.get(7)?,
        phone: row.get(8)?,
        email: row.get(9)?,
        manager_name: row.get(10)?,
        capacity: row.get(11)?,
        is_active: row.get(12)?,
        created_at: ts_from_sql(13, &row.get::<_, String>(13)?)?,
        updated_at: ts_from_sql(14, &row.get::<_, String>(14)?)?,
    })
}

pub fn insert(conn: &Connection, warehouse: &Warehouse) -> Result<()> {
    check_unique(conn, &warehouse.name, &warehouse.code, None)?;
    conn.execute(
        "INSERT INTO warehouses (id, name, code, address, city, state, postal_code, country, \
         phone, email, manager_name, capacity, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            warehouse.id.to_string(),
            warehouse.name,
            warehouse.code,
            warehouse.address,
            warehouse.city,
            warehouse.state,
            warehouse.postal_code,
            warehouse.country,
            warehouse.phone,
            warehouse.email,
            warehouse.manager_name,
            warehouse.capacity,
            warehouse.is_active,
            encode_ts(&warehouse.created_at),
            encode_ts(&warehouse.updated_at),
        ],
    )?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: Uuid) -> Result<Warehouse> {
    conn.query_row(
        &format!("SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE id = ?1"),
        params![id.to_string()],
        warehouse_from_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound("warehouse"))
}

/// Active warehouses only, as the catalog listing shows them.
pub fn list(conn: &Connection) -> Result<Vec<Warehouse>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE is_active = 1 ORDER BY name"
    ))?;
    let rows = stmt.query_map([], warehouse_from_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StoreError::from)
}

#[derive(Default)]
pub struct WarehousePatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub manager_name: Option<String>,
    pub capacity: Option<i64>,
    pub is_active: Option<bool>,
}

pub fn update(
    conn: &Connection,
    id: Uuid,
    patch: &WarehousePatch,
    now: DateTime<Utc>,
) -> Result<Warehouse> {
    let current = find_by_id(conn, id)?;
    let name = patch.name.clone().unwrap_or(current.name);
    let code = patch.code.clone().unwrap_or(current.code);
    check_unique(conn, &name, &code, Some(id))?;
    conn.execute(
        "UPDATE warehouses SET name = ?2, code = ?3, address = ?4, city = ?5, state = ?6, \
         postal_code = ?7, country = ?8, phone = ?9, email = ?10, manager_name = ?11, \
         capacity = ?12, is_active = ?13, updated_at = ?14 WHERE id = ?1",
        params![
            id.to_string(),
            name,
            code,
            patch.address.clone().or(current.address),
            patch.city.clone().or(current.city),
            patch.state.clone().or(current.state),
            patch.postal_code.clone().or(current.postal_code),
            patch.country.clone().unwrap_or(current.country),
            patch.phone.clone().or(current.phone),
            patch.email.clone().or(current.email),
            patch.manager_name.clone().or(current.manager_name),
            patch.capacity.unwrap_or(current.capacity),
            patch.is_active.unwrap_or(current.is_active),
            encode_ts(&now),
        ],
    )?;
    find_by_id(conn, id)
}

/// Deletion is refused while the warehouse still holds stock or appears in
/// transaction history.
pub fn delete(conn: &Connection, id: Uuid) -> Result<()> {
    let id_text = id.to_string();
    let stocked: i64 = conn.query_row(
        "SELECT COUNT(*) FROM inventory WHERE warehouse_id = ?1 AND quantity > 0",
        params![id_text],
        |r| r.get(0),
    )?;
    if stocked > 0 {
        return Err(StoreError::Conflict(
            "warehouse still holds stock and cannot be deleted".to_string(),
        ));
    }
    let referenced: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions \
         WHERE warehouse_id = ?1 OR destination_warehouse_id = ?1",
        params![id_text],
        |r| r.get(0),
    )?;
    if referenced > 0 {
        return Err(StoreError::Conflict(
            "warehouse appears in transaction history and cannot be deleted".to_string(),
        ));
    }
    conn.execute("DELETE FROM inventory WHERE warehouse_id = ?1", params![id_text])?;
    let changed = conn.execute("DELETE FROM warehouses WHERE id = ?1", params![id_text])?;
    if changed == 0 {
        return Err(StoreError::NotFound("warehouse"));
    }
    Ok(())
}

fn check_unique(conn: &Connection, name: &str, code: &str, exclude: Option<Uuid>) -> Result<()> {
    let exclude = exclude.map(|id| id.to_string()).unwrap_or_default();
    let taken: Option<String> = conn
        .query_row(
            "SELECT name FROM warehouses WHERE (name = ?1 OR code = ?2) AND id != ?3 LIMIT 1",
            params![name, code, exclude],
            |r| r.get(0),
        )
        .optional()?;
    match taken {
        Some(existing) if existing == name => Err(StoreError::Conflict(
            "warehouse name is already in use".to_string(),
        )),
        Some(_) => Err(StoreError::Conflict(
            "warehouse code is already in use".to_string(),
        )),
        None => Ok(()),
    }
}
