// SPDX-License-Identifier: Apache-2.0

use rusqlite::Connection;

use crate::Result;

/// Idempotent schema bootstrap. Uniqueness and non-negative stock are
/// enforced here as well as in the application layer.
pub fn bootstrap(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'viewer',
    is_active     INTEGER NOT NULL DEFAULT 1,
    last_login    TEXT,
    avatar        TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    description TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS warehouses (
    id           TEXT PRIMARY KEY,
    name         TEXT NOT NULL UNIQUE,
    code         TEXT NOT NULL UNIQUE,
    address      TEXT,
    city         TEXT,
    state        TEXT,
    postal_code  TEXT,
    country      TEXT NOT NULL DEFAULT 'Iran',
    phone        TEXT,
    email        TEXT,
    manager_name TEXT,
    capacity     INTEGER NOT NULL DEFAULT 0,
    is_active    INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
    id              TEXT PRIMARY KEY,
    code            TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL,
    description     TEXT,
    category_id     TEXT NOT NULL REFERENCES categories(id),
    unit            TEXT NOT NULL,
    unit_price      REAL NOT NULL DEFAULT 0 CHECK (unit_price >= 0),
    cost_price      REAL NOT NULL DEFAULT 0 CHECK (cost_price >= 0),
    min_stock_level INTEGER NOT NULL DEFAULT 0 CHECK (min_stock_level >= 0),
    max_stock_level INTEGER CHECK (max_stock_level IS NULL OR max_stock_level >= 0),
    weight          REAL CHECK (weight IS NULL OR weight >= 0),
    dimensions      TEXT,
    barcode         TEXT UNIQUE,
    sku             TEXT UNIQUE,
    image           TEXT,
    is_active       INTEGER NOT NULL DEFAULT 1,
    tags            TEXT NOT NULL DEFAULT '[]',
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_products_category ON products(category_id);
CREATE INDEX IF NOT EXISTS idx_products_is_active ON products(is_active);

CREATE TABLE IF NOT EXISTS inventory (
    id                TEXT PRIMARY KEY,
    product_id        TEXT NOT NULL REFERENCES products(id),
    warehouse_id      TEXT NOT NULL REFERENCES warehouses(id),
    quantity          INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
    reserved_quantity INTEGER NOT NULL DEFAULT 0 CHECK (reserved_quantity >= 0),
    location          TEXT,
    last_count_date   TEXT,
    notes             TEXT,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    UNIQUE (product_id, warehouse_id)
);
CREATE INDEX IF NOT EXISTS idx_inventory_warehouse ON inventory(warehouse_id);
CREATE INDEX IF NOT EXISTS idx_inventory_quantity ON inventory(quantity);

CREATE TABLE IF NOT EXISTS transactions (
    id                       TEXT PRIMARY KEY,
    kind                     TEXT NOT NULL,
    reference_number         TEXT NOT NULL UNIQUE,
    product_id               TEXT NOT NULL REFERENCES products(id),
    warehouse_id             TEXT NOT NULL REFERENCES warehouses(id),
    destination_warehouse_id TEXT REFERENCES warehouses(id),
    user_id                  TEXT NOT NULL REFERENCES users(id),
    quantity                 INTEGER NOT NULL CHECK (quantity >= 1),
    unit_cost                REAL NOT NULL DEFAULT 0 CHECK (unit_cost >= 0),
    reason                   TEXT,
    notes                    TEXT,
    supplier_name            TEXT,
    supplier_contact         TEXT,
    customer_name            TEXT,
    customer_contact         TEXT,
    batch_number             TEXT,
    expiry_date              TEXT,
    transaction_date         TEXT NOT NULL,
    status                   TEXT NOT NULL DEFAULT 'completed',
    created_at               TEXT NOT NULL,
    updated_at               TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transactions_product ON transactions(product_id);
CREATE INDEX IF NOT EXISTS idx_transactions_warehouse ON transactions(warehouse_id);
CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);
CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(transaction_date);
CREATE INDEX IF NOT EXISTS idx_transactions_kind ON transactions(kind);
CREATE INDEX IF NOT EXISTS idx_transactions_status ON transactions(status);
";
