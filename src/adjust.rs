//! Mutating commands: `wck stock` and `wck favorite`.

use anyhow::Result;

use wasabi_check_core::inventory;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// Apply a ±1 store-stock change and print the new quantity.
pub async fn run_stock(config: &Config, barcode: &str, delta: i64) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let level = inventory::adjust_stock(&store, barcode, delta)
        .await?
        .ok_or_else(|| anyhow::anyhow!("barcode not found: {}", barcode.trim()))?;
    println!("{}: store stock {}", level.barcode, level.new_quantity);
    Ok(())
}

/// Flip a product's favorite flag and print the new state.
pub async fn run_favorite(config: &Config, product_number: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let flag = inventory::toggle_favorite(&store, product_number)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product not found: {}", product_number.trim()))?;
    println!(
        "{}: favorite {}",
        product_number.trim(),
        if flag { "on" } else { "off" }
    );
    Ok(())
}
