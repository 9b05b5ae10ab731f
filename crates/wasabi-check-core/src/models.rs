//! Catalog data types shared by every backend and surface.

use serde::Serialize;

/// A catalog product, keyed by `product_number`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub product_number: String,
    pub product_name: String,
    pub is_favorite: bool,
    pub release_year: Option<i64>,
    pub item_category: Option<String>,
}

/// A sellable SKU of a [`Product`], keyed by `barcode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variant {
    pub barcode: String,
    pub product_number: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub store_stock: i64,
    pub hq_stock: i64,
    pub original_price: i64,
    pub sale_price: i64,
}

/// A product together with its variants in display order.
#[derive(Debug, Clone, Serialize)]
pub struct ProductWithVariants {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<Variant>,
}

/// Row counts of the two catalog tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub products: usize,
    pub variants: usize,
}

/// Store stock after applying `delta`; never below zero.
pub fn next_stock(current: i64, delta: i64) -> i64 {
    current.saturating_add(delta).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_at_zero_clamps() {
        assert_eq!(next_stock(0, -1), 0);
    }

    #[test]
    fn increment_and_decrement() {
        assert_eq!(next_stock(3, 1), 4);
        assert_eq!(next_stock(3, -1), 2);
    }
}
