//! User rows. Uniqueness of username and email is pre-checked so callers get
//! a `Conflict` naming the offending field instead of a raw constraint error.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use stockroom_model::{Role, User};
use uuid::Uuid;

use crate::{encode_opt_ts, encode_ts, opt_ts_from_sql, ts_from_sql, uuid_from_sql, Result, StoreError};

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
     role, is_active, last_login, avatar, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role_raw: String = row.get(6)?;
    let role = role_raw.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(User {
        id: uuid_from_sql(0, &row.get::<_, String>(0)?)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        role,
        is_active: row.get(7)?,
        last_login: opt_ts_from_sql(8, row.get(8)?)?,
        avatar: row.get(9)?,
        created_at: ts_from_sql(10, &row.get::<_, String>(10)?)?,
        updated_at: ts_from_sql(11, &row.get::<_, String>(11)?)?,
    })
}

pub fn insert(conn: &Connection, user: &User) -> Result<()> {
    check_unique(conn, &user.username, &user.email, None)?;
    conn.execute(
        "INSERT INTO users (id, username, email, password_hash, first_name, last_name, \
         role, is_active, last_login, avatar, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            user.id.to_string(),
            user.username,
            user.email,
            user.password_hash,
            user.first_name,
            user.last_name,
            user.role.as_str(),
            user.is_active,
            encode_opt_ts(&user.last_login),
            user.avatar,
            encode_ts(&user.created_at),
            encode_ts(&user.updated_at),
        ],
    )?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: Uuid) -> Result<User> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id.to_string()],
        user_from_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound("user"))
}

/// Login lookup. The identifier may be a username or an email address.
pub fn find_by_identifier(conn: &Connection, identifier: &str) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1 OR email = ?1"),
        params![identifier],
        user_from_row,
    )
    .optional()
    .map_err(StoreError::from)
}

pub fn list(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at"))?;
    let rows = stmt.query_map([], user_from_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StoreError::from)
}

pub fn count(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
        .map_err(StoreError::from)
}

pub fn record_login(conn: &Connection, id: Uuid, at: DateTime<Utc>) -> Result<()> {
    let changed = conn.execute(
        "UPDATE users SET last_login = ?2, updated_at = ?2 WHERE id = ?1",
        params![id.to_string(), encode_ts(&at)],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound("user"));
    }
    Ok(())
}

pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

pub fn update_profile(
    conn: &Connection,
    id: Uuid,
    patch: &ProfilePatch,
    now: DateTime<Utc>,
) -> Result<User> {
    let current = find_by_id(conn, id)?;
    let email = patch.email.clone().unwrap_or(current.email);
    check_unique(conn, &current.username, &email, Some(id))?;
    conn.execute(
        "UPDATE users SET first_name = ?2, last_name = ?3, email = ?4, updated_at = ?5 \
         WHERE id = ?1",
        params![
            id.to_string(),
            patch.first_name.as_ref().unwrap_or(&current.first_name),
            patch.last_name.as_ref().unwrap_or(&current.last_name),
            email,
            encode_ts(&now),
        ],
    )?;
    find_by_id(conn, id)
}

pub fn set_password_hash(
    conn: &Connection,
    id: Uuid,
    hash: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let changed = conn.execute(
        "UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1",
        params![id.to_string(), hash, encode_ts(&now)],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound("user"));
    }
    Ok(())
}

fn check_unique(
    conn: &Connection,
    username: &str,
    email: &str,
    exclude: Option<Uuid>,
) -> Result<()> {
    let exclude = exclude.map(|id| id.to_string()).unwrap_or_default();
    let taken: Option<String> = conn
        .query_row(
            "SELECT username FROM users WHERE (username = ?1 OR email = ?2) AND id != ?3 LIMIT 1",
            params![username, email, exclude],
            |r| r.get(0),
        )
        .optional()?;
    match taken {
        Some(existing) if existing == username => Err(StoreError::Conflict(
            "username is already taken".to_string(),
        )),
        Some(_) => Err(StoreError::Conflict(
            "email is already registered".to_string(),
        )),
        None => Ok(()),
    }
}
