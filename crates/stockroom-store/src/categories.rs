use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use stockroom_model::Category;
use uuid::Uuid;

use crate::{encode_ts, ts_from_sql, uuid_from_sql, Result, StoreError};

const CATEGORY_COLUMNS: &str = "id, name, description, is_active, created_at, updated_at";

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: uuid_from_sql(0, &row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        description: row.get(2)?,
        is_active: row.get(3)?,
        created_at: ts_from_sql(4, &row.get::<_, String>(4)?)?,
        updated_at: ts_from_sql(5, &row.get::<_, String>(5)?)?,
    })
}

pub fn insert(conn: &Connection, category: &Category) -> Result<()> {
    check_unique_name(conn, &category.name, None)?;
    conn.execute(
        "INSERT INTO categories (id, name, description, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            category.id.to_string(),
            category.name,
            category.description,
            category.is_active,
            encode_ts(&category.created_at),
            encode_ts(&category.updated_at),
        ],
    )?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: Uuid) -> Result<Category> {
    conn.query_row(
        &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
        params![id.to_string()],
        category_from_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound("category"))
}

/// Active categories only, as the catalog listing shows them.
pub fn list(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE is_active = 1 ORDER BY name"
    ))?;
    let rows = stmt.query_map([], category_from_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StoreError::from)
}

pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

pub fn update(
    conn: &Connection,
    id: Uuid,
    patch: &CategoryPatch,
    now: DateTime<Utc>,
) -> Result<Category> {
    let current = find_by_id(conn, id)?;
    let name = patch.name.clone().unwrap_or(current.name);
    check_unique_name(conn, &name, Some(id))?;
    conn.execute(
        "UPDATE categories SET name = ?2, description = ?3, is_active = ?4, updated_at = ?5 \
         WHERE id = ?1",
        params![
            id.to_string(),
            name,
            patch.description.clone().or(current.description),
            patch.is_active.unwrap_or(current.is_active),
            encode_ts(&now),
        ],
    )?;
    find_by_id(conn, id)
}

/// Deletion is refused while any product still references the category.
pub fn delete(conn: &Connection, id: Uuid) -> Result<()> {
    let in_use: i64 = conn.query_row(
        "SELECT COUNT(*) FROM products WHERE category_id = ?1",
        params![id.to_string()],
        |r| r.get(0),
    )?;
    if in_use > 0 {
        return Err(StoreError::Conflict(format!(
            "category has {in_use} product(s) and cannot be deleted"
        )));
    }
    let changed = conn.execute(
        "DELETE FROM categories WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound("category"));
    }
    Ok(())
}

fn check_unique_name(conn: &Connection, name: &str, exclude: Option<Uuid>) -> Result<()> {
    let exclude = exclude.map(|id| id.to_string()).unwrap_or_default();
    let taken: Option<String> = conn
        .query_row(
            "SELECT id FROM categories WHERE name = ?1 AND id != ?2 LIMIT 1",
            params![name, exclude],
            |r| r.get(0),
        )
        .optional()?;
    if taken.is_some() {
        return Err(StoreError::Conflict(
            "category name is already in use".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::open_in_memory;

    pub(crate) fn sample_category(name: &str) -> Category {
        let now = crate::test_now();
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn crud_round_trip() {
        let conn = open_in_memory().expect("open");
        let category = sample_category("Electronics");
        insert(&conn, &category).expect("insert");
        assert_eq!(find_by_id(&conn, category.id).expect("find"), category);

        let updated = update(
            &conn,
            category.id,
            &CategoryPatch {
                name: None,
                description: Some("Devices and parts".to_string()),
                is_active: Some(false),
            },
            Utc::now(),
        )
        .expect("update");
        assert_eq!(updated.name, "Electronics");
        assert_eq!(updated.description.as_deref(), Some("Devices and parts"));
        assert!(!updated.is_active);

        delete(&conn, category.id).expect("delete");
        assert!(matches!(
            find_by_id(&conn, category.id),
            Err(StoreError::NotFound("category"))
        ));
    }

    #[test]
    fn duplicate_name_is_a_conflict() {
        let conn = open_in_memory().expect("open");
        insert(&conn, &sample_category("Electronics")).expect("first");
        let err = insert(&conn, &sample_category("Electronics")).expect_err("dup");
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn list_is_sorted_by_name() {
        let conn = open_in_memory().expect("open");
        insert(&conn, &sample_category("Tools")).expect("tools");
        insert(&conn, &sample_category("Apparel")).expect("apparel");
        let names: Vec<String> = list(&conn)
            .expect("list")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Apparel", "Tools"]);
    }

    #[test]
    fn list_skips_deactivated_categories() {
        let conn = open_in_memory().expect("open");
        insert(&conn, &sample_category("Tools")).expect("tools");
        let retired = sample_category("Apparel");
        insert(&conn, &retired).expect("apparel");
        update(
            &conn,
            retired.id,
            &CategoryPatch {
                name: None,
                description: None,
                is_active: Some(false),
            },
            Utc::now(),
        )
        .expect("deactivate");

        let names: Vec<String> = list(&conn)
            .expect("list")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Tools"]);
        // The row itself survives and stays addressable.
        assert!(!find_by_id(&conn, retired.id).expect("find").is_active);
    }
}
