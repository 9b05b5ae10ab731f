use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create tables and indexes if they do not exist yet.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // `product_key` / `barcode_key` hold the normalized identifier so prefix
    // lookups compare the same canonical form the matcher produces.
    // `number_folded` / `name_folded` are Unicode-lowercased in Rust; SQLite's
    // `lower()` only folds ASCII.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            product_number TEXT PRIMARY KEY,
            product_key TEXT NOT NULL,
            product_name TEXT NOT NULL DEFAULT '',
            number_folded TEXT NOT NULL DEFAULT '',
            name_folded TEXT NOT NULL DEFAULT '',
            is_favorite INTEGER NOT NULL DEFAULT 0,
            release_year INTEGER,
            item_category TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS variants (
            barcode TEXT PRIMARY KEY,
            barcode_key TEXT NOT NULL,
            product_number TEXT NOT NULL,
            color TEXT,
            size TEXT,
            store_stock INTEGER NOT NULL DEFAULT 0,
            hq_stock INTEGER NOT NULL DEFAULT 0,
            original_price INTEGER NOT NULL DEFAULT 0,
            sale_price INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (product_number) REFERENCES products(product_number) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_key ON products(product_key)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_name ON products(product_name)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_favorite ON products(is_favorite)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_variants_key ON variants(barcode_key)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_variants_product ON variants(product_number)")
        .execute(pool)
        .await?;

    Ok(())
}
