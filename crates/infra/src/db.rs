//! SQLite connection pool and schema.
//!
//! The pool runs in WAL mode with foreign keys enforced and a busy timeout equal to the
//! configured lock timeout, so a writer waiting on another writer blocks for a bounded
//! time and then fails with `SQLITE_BUSY`.

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};

use crate::config::AppConfig;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS warehouses (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    code        TEXT NOT NULL,
    address     TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT,
    deleted_at  TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS ux_warehouses_live_code
    ON warehouses(code) WHERE deleted_at IS NULL;

CREATE TABLE IF NOT EXISTS products (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    sku         TEXT NOT NULL,
    name        TEXT NOT NULL,
    unit        TEXT NOT NULL DEFAULT 'pcs',
    price       REAL CHECK (price IS NULL OR price >= 0),
    created_at  TEXT NOT NULL,
    updated_at  TEXT,
    deleted_at  TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS ux_products_live_sku
    ON products(sku) WHERE deleted_at IS NULL;

CREATE TABLE IF NOT EXISTS inventory (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    warehouse_id  INTEGER NOT NULL REFERENCES warehouses(id),
    product_id    INTEGER NOT NULL REFERENCES products(id),
    qty           INTEGER NOT NULL DEFAULT 0 CHECK (qty >= 0),
    created_at    TEXT NOT NULL,
    updated_at    TEXT,
    UNIQUE (warehouse_id, product_id)
);

CREATE TABLE IF NOT EXISTS stock_movements (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    movement_type    TEXT NOT NULL CHECK (movement_type IN ('IN', 'OUT', 'TRANSFER', 'ADJUST')),
    warehouse_id     INTEGER NOT NULL REFERENCES warehouses(id),
    warehouse_to_id  INTEGER REFERENCES warehouses(id),
    product_id       INTEGER NOT NULL REFERENCES products(id),
    qty              INTEGER NOT NULL CHECK (qty > 0),
    reason           TEXT,
    ref_no           TEXT,
    src_qty_before   INTEGER NOT NULL,
    src_qty_after    INTEGER NOT NULL,
    dst_qty_before   INTEGER,
    dst_qty_after    INTEGER,
    created_at       TEXT NOT NULL,
    CHECK ((movement_type = 'TRANSFER') = (warehouse_to_id IS NOT NULL))
);
CREATE INDEX IF NOT EXISTS idx_movements_key
    ON stock_movements(product_id, warehouse_id, created_at);
CREATE INDEX IF NOT EXISTS idx_movements_dest
    ON stock_movements(warehouse_to_id);

CREATE TRIGGER IF NOT EXISTS stock_movements_no_update
BEFORE UPDATE ON stock_movements
BEGIN
    SELECT RAISE(ABORT, 'stock_movements is append-only');
END;

CREATE TRIGGER IF NOT EXISTS stock_movements_no_delete
BEFORE DELETE ON stock_movements
BEGIN
    SELECT RAISE(ABORT, 'stock_movements is append-only');
END;
"#;

/// Open the pool described by `config` and make sure the schema exists.
pub async fn connect(config: &AppConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("invalid DATABASE_URL {:?}", config.database_url))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(config.lock_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.lock_timeout)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open SQLite database at {:?}", config.database_url))?;

    migrate(&pool).await?;
    tracing::info!(database_url = %config.database_url, "database ready");
    Ok(pool)
}

/// Create tables, indexes and triggers (idempotent).
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .context("failed to apply schema")?;
    Ok(())
}
