//! Catalog statistics for `wck stats`.

use anyhow::Result;
use wasabi_check_core::store::Store;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let pool = store.pool();

    let counts = store.counts().await?;
    let favorites: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_favorite != 0")
        .fetch_one(pool)
        .await?;
    let store_stock: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(store_stock), 0) FROM variants")
        .fetch_one(pool)
        .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Wasabi Check: Catalog Stats");
    println!("===========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Products:    {}", counts.products);
    println!("  Variants:    {}", counts.variants);
    println!("  Favorites:   {}", favorites);
    println!("  Store stock: {}", store_stock);
    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
