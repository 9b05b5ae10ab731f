//! SQLite-backed [`Store`] implementation.
//!
//! Maps each [`Store`] operation onto the `products` / `variants` schema
//! created by [`migrate`](crate::migrate). Normalized identifier columns
//! are computed here at insert time with the same
//! [`normalize`](wasabi_check_core::normalize::normalize) the matcher uses,
//! and case-folded copies of number and name back the substring searches.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use wasabi_check_core::models::{next_stock, CatalogCounts, Product, Variant};
use wasabi_check_core::normalize::normalize;
use wasabi_check_core::store::Store;

use crate::config::Config;
use crate::{db, migrate};

const PRODUCT_COLUMNS: &str =
    "product_number, product_name, is_favorite, release_year, item_category";

const VARIANT_COLUMNS: &str = "barcode, product_number, color, size, store_stock, hq_stock, \
                               original_price, sale_price";

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database, creating the schema if needed.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::apply(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn product_from_row(row: &SqliteRow) -> Product {
    Product {
        product_number: row.get("product_number"),
        product_name: row.get("product_name"),
        is_favorite: row.get::<i64, _>("is_favorite") != 0,
        release_year: row.get("release_year"),
        item_category: row.get("item_category"),
    }
}

fn variant_from_row(row: &SqliteRow) -> Variant {
    Variant {
        barcode: row.get("barcode"),
        product_number: row.get("product_number"),
        color: row.get("color"),
        size: row.get("size"),
        store_stock: row.get("store_stock"),
        hq_stock: row.get("hq_stock"),
        original_price: row.get("original_price"),
        sale_price: row.get("sale_price"),
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_product(&self, product_number: &str) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE product_number = ?"
        ))
        .bind(product_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(product_from_row))
    }

    async fn variants_of(&self, product_number: &str) -> Result<Vec<Variant>> {
        let rows = sqlx::query(&format!(
            "SELECT {VARIANT_COLUMNS} FROM variants WHERE product_number = ?"
        ))
        .bind(product_number)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(variant_from_row).collect())
    }

    async fn first_variant_with_barcode_prefix(
        &self,
        key_prefix: &str,
    ) -> Result<Option<Variant>> {
        let row = sqlx::query(&format!(
            "SELECT {VARIANT_COLUMNS} FROM variants
             WHERE substr(barcode_key, 1, length(?1)) = ?1
             ORDER BY barcode_key
             LIMIT 1"
        ))
        .bind(key_prefix)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(variant_from_row))
    }

    async fn products_with_number_prefix(&self, key_prefix: &str) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE substr(product_key, 1, length(?1)) = ?1
             ORDER BY product_number"
        ))
        .bind(key_prefix)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn search_products(&self, text: &str, compact: Option<&str>) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE instr(number_folded, ?1) > 0
                OR instr(name_folded, ?1) > 0
                OR (?2 IS NOT NULL AND instr(number_folded, ?2) > 0)
             ORDER BY product_name, product_number"
        ))
        .bind(text.to_lowercase())
        .bind(compact.map(str::to_lowercase))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn products_with_name_containing(
        &self,
        term: &str,
        exclude: &str,
        limit: usize,
    ) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE instr(name_folded, ?1) > 0
               AND product_number != ?2
             ORDER BY product_name, product_number
             LIMIT ?3"
        ))
        .bind(term.to_lowercase())
        .bind(exclude)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn favorite_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE is_favorite != 0
             ORDER BY product_name, product_number"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn adjust_store_stock(&self, barcode: &str, delta: i64) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT store_stock FROM variants WHERE barcode = ?")
                .bind(barcode)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(current) = current else {
            return Ok(None);
        };

        let updated = next_stock(current, delta);
        sqlx::query("UPDATE variants SET store_stock = ? WHERE barcode = ?")
            .bind(updated)
            .bind(barcode)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn toggle_favorite(&self, product_number: &str) -> Result<Option<bool>> {
        let mut tx = self.pool.begin().await?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT is_favorite FROM products WHERE product_number = ?")
                .bind(product_number)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(current) = current else {
            return Ok(None);
        };

        let flipped = current == 0;
        sqlx::query("UPDATE products SET is_favorite = ? WHERE product_number = ?")
            .bind(flipped as i64)
            .bind(product_number)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(flipped))
    }

    async fn replace_catalog(
        &self,
        products: &[Product],
        variants: &[Variant],
    ) -> Result<CatalogCounts> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM variants").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM products").execute(&mut *tx).await?;

        for p in products {
            sqlx::query(
                "INSERT INTO products (product_number, product_key, product_name, number_folded,
                                       name_folded, is_favorite, release_year, item_category)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&p.product_number)
            .bind(normalize(&p.product_number))
            .bind(&p.product_name)
            .bind(p.product_number.to_lowercase())
            .bind(p.product_name.to_lowercase())
            .bind(p.is_favorite as i64)
            .bind(p.release_year)
            .bind(&p.item_category)
            .execute(&mut *tx)
            .await?;
        }

        for v in variants {
            sqlx::query(
                "INSERT INTO variants (barcode, barcode_key, product_number, color, size,
                                       store_stock, hq_stock, original_price, sale_price)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&v.barcode)
            .bind(normalize(&v.barcode))
            .bind(&v.product_number)
            .bind(&v.color)
            .bind(&v.size)
            .bind(v.store_stock)
            .bind(v.hq_stock)
            .bind(v.original_price)
            .bind(v.sale_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(CatalogCounts {
            products: products.len(),
            variants: variants.len(),
        })
    }

    async fn counts(&self) -> Result<CatalogCounts> {
        let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        let variants: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM variants")
            .fetch_one(&self.pool)
            .await?;
        Ok(CatalogCounts {
            products: products as usize,
            variants: variants as usize,
        })
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
