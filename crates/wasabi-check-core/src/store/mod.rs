//! Storage abstraction for the catalog.
//!
//! The [`Store`] trait is every storage primitive the matcher, importer and
//! inventory operations need, so backends are pluggable (SQLite in the
//! application crate, [`memory::InMemoryStore`] for tests).
//!
//! Identifier arguments named `*_key` / `key_prefix` are already passed
//! through [`normalize`](crate::normalize::normalize); backends compare
//! them against identifiers normalized the same way.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CatalogCounts, Product, Variant};

/// Abstract storage backend for the catalog.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_product`](Store::get_product) | Product by exact `product_number` |
/// | [`variants_of`](Store::variants_of) | All variants of a product |
/// | [`first_variant_with_barcode_prefix`](Store::first_variant_with_barcode_prefix) | Barcode prefix lookup |
/// | [`products_with_number_prefix`](Store::products_with_number_prefix) | Product-number prefix lookup |
/// | [`search_products`](Store::search_products) | Case-insensitive substring search |
/// | [`products_with_name_containing`](Store::products_with_name_containing) | Related-product lookup |
/// | [`favorite_products`](Store::favorite_products) | Favorites |
/// | [`adjust_store_stock`](Store::adjust_store_stock) | ±1 stock change in one transaction |
/// | [`toggle_favorite`](Store::toggle_favorite) | Flip `is_favorite` in one transaction |
/// | [`replace_catalog`](Store::replace_catalog) | Atomic delete-then-insert of the whole catalog |
/// | [`counts`](Store::counts) | Table row counts |
/// | [`ping`](Store::ping) | Cheap round-trip to keep the backend awake |
#[async_trait]
pub trait Store: Send + Sync {
    /// Product by exact (un-normalized) `product_number`.
    async fn get_product(&self, product_number: &str) -> Result<Option<Product>>;

    /// Variants of a product, in no particular order.
    async fn variants_of(&self, product_number: &str) -> Result<Vec<Variant>>;

    /// The variant with the smallest normalized barcode that starts with
    /// `key_prefix`.
    async fn first_variant_with_barcode_prefix(&self, key_prefix: &str)
        -> Result<Option<Variant>>;

    /// Products whose normalized `product_number` starts with `key_prefix`,
    /// ordered by `product_number`.
    async fn products_with_number_prefix(&self, key_prefix: &str) -> Result<Vec<Product>>;

    /// Products whose `product_number` or `product_name` contains `text`,
    /// or whose `product_number` contains `compact` (when given). Matching
    /// is case-insensitive; each product appears once; ordered by
    /// `product_name`, then `product_number`.
    async fn search_products(&self, text: &str, compact: Option<&str>) -> Result<Vec<Product>>;

    /// Up to `limit` products whose name contains `term` (case-insensitive),
    /// excluding `exclude`.
    async fn products_with_name_containing(
        &self,
        term: &str,
        exclude: &str,
        limit: usize,
    ) -> Result<Vec<Product>>;

    /// Favorite products ordered by `product_name`.
    async fn favorite_products(&self) -> Result<Vec<Product>>;

    /// Apply `delta` to `store_stock`, clamping at zero, inside one
    /// transaction. Returns the new stock, or `None` if no variant has this
    /// exact barcode.
    async fn adjust_store_stock(&self, barcode: &str, delta: i64) -> Result<Option<i64>>;

    /// Flip `is_favorite` inside one transaction. Returns the new flag, or
    /// `None` if the product does not exist.
    async fn toggle_favorite(&self, product_number: &str) -> Result<Option<bool>>;

    /// Delete every variant and product, then insert `products` and
    /// `variants`, as one transaction. On error nothing changes.
    async fn replace_catalog(
        &self,
        products: &[Product],
        variants: &[Variant],
    ) -> Result<CatalogCounts>;

    /// Current row counts.
    async fn counts(&self) -> Result<CatalogCounts>;

    /// No-op round trip.
    async fn ping(&self) -> Result<()>;
}
