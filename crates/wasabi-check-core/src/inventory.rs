//! Per-item mutations: store stock ±1 and the favorite flag.
//!
//! Both run as one backend transaction. Concurrent adjustments of the same
//! variant are read-modify-write and the last commit wins.

use serde::Serialize;

use crate::error::{CatalogError, Result};
use crate::store::Store;

/// New stock level after an adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    pub barcode: String,
    pub new_quantity: i64,
}

/// Only single-unit steps are accepted.
pub fn validate_delta(delta: i64) -> Result<i64> {
    match delta {
        1 | -1 => Ok(delta),
        other => Err(CatalogError::InvalidDelta(other)),
    }
}

/// Add or remove one unit of store stock. `None` when the barcode is
/// unknown. Decrementing at zero stays at zero.
pub async fn adjust_stock<S: Store + ?Sized>(
    store: &S,
    barcode: &str,
    delta: i64,
) -> Result<Option<StockLevel>> {
    let delta = validate_delta(delta)?;
    let barcode = barcode.trim();
    if barcode.is_empty() {
        return Err(CatalogError::EmptyQuery);
    }
    let new_quantity = store
        .adjust_store_stock(barcode, delta)
        .await
        .map_err(CatalogError::Transaction)?;
    Ok(new_quantity.map(|new_quantity| StockLevel {
        barcode: barcode.to_string(),
        new_quantity,
    }))
}

/// Flip a product's favorite flag. `None` when the product is unknown.
pub async fn toggle_favorite<S: Store + ?Sized>(
    store: &S,
    product_number: &str,
) -> Result<Option<bool>> {
    let product_number = product_number.trim();
    if product_number.is_empty() {
        return Err(CatalogError::EmptyQuery);
    }
    store
        .toggle_favorite(product_number)
        .await
        .map_err(CatalogError::Transaction)
}
