//! In-memory [`Store`] implementation for tests and embedding.
//!
//! Both tables live behind one `std::sync::RwLock`. Mutations build their
//! result before taking the write lock's effect, so a failed
//! [`replace_catalog`](Store::replace_catalog) leaves the old catalog in
//! place, same as a rolled-back SQLite transaction.

use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::models::{next_stock, CatalogCounts, Product, Variant};
use crate::normalize::normalize;

use super::Store;

#[derive(Default, Clone)]
struct Catalog {
    products: BTreeMap<String, Product>,
    variants: BTreeMap<String, Variant>,
}

/// In-memory catalog store.
pub struct InMemoryStore {
    catalog: RwLock<Catalog>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(Catalog::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn by_name(products: &mut [Product]) {
    products.sort_by(|a, b| {
        a.product_name
            .cmp(&b.product_name)
            .then_with(|| a.product_number.cmp(&b.product_number))
    });
}

fn build_catalog(products: &[Product], variants: &[Variant]) -> Result<Catalog> {
    let mut catalog = Catalog::default();
    for p in products {
        if p.product_number.is_empty() {
            bail!("product with empty product_number");
        }
        if catalog
            .products
            .insert(p.product_number.clone(), p.clone())
            .is_some()
        {
            bail!("duplicate product_number: {}", p.product_number);
        }
    }
    for v in variants {
        if v.barcode.is_empty() {
            bail!("variant with empty barcode");
        }
        if !catalog.products.contains_key(&v.product_number) {
            bail!(
                "variant {} references unknown product {}",
                v.barcode,
                v.product_number
            );
        }
        if catalog.variants.insert(v.barcode.clone(), v.clone()).is_some() {
            bail!("duplicate barcode: {}", v.barcode);
        }
    }
    Ok(catalog)
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_product(&self, product_number: &str) -> Result<Option<Product>> {
        let catalog = self.catalog.read().unwrap();
        Ok(catalog.products.get(product_number).cloned())
    }

    async fn variants_of(&self, product_number: &str) -> Result<Vec<Variant>> {
        let catalog = self.catalog.read().unwrap();
        Ok(catalog
            .variants
            .values()
            .filter(|v| v.product_number == product_number)
            .cloned()
            .collect())
    }

    async fn first_variant_with_barcode_prefix(
        &self,
        key_prefix: &str,
    ) -> Result<Option<Variant>> {
        let catalog = self.catalog.read().unwrap();
        Ok(catalog
            .variants
            .values()
            .map(|v| (normalize(&v.barcode), v))
            .filter(|(key, _)| key.starts_with(key_prefix))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, v)| v.clone()))
    }

    async fn products_with_number_prefix(&self, key_prefix: &str) -> Result<Vec<Product>> {
        let catalog = self.catalog.read().unwrap();
        Ok(catalog
            .products
            .values()
            .filter(|p| normalize(&p.product_number).starts_with(key_prefix))
            .cloned()
            .collect())
    }

    async fn search_products(&self, text: &str, compact: Option<&str>) -> Result<Vec<Product>> {
        let text_lower = text.to_lowercase();
        let compact_lower = compact.map(str::to_lowercase);
        let catalog = self.catalog.read().unwrap();
        let mut hits: Vec<Product> = catalog
            .products
            .values()
            .filter(|p| {
                contains_ci(&p.product_number, &text_lower)
                    || contains_ci(&p.product_name, &text_lower)
                    || compact_lower
                        .as_deref()
                        .is_some_and(|c| contains_ci(&p.product_number, c))
            })
            .cloned()
            .collect();
        by_name(&mut hits);
        Ok(hits)
    }

    async fn products_with_name_containing(
        &self,
        term: &str,
        exclude: &str,
        limit: usize,
    ) -> Result<Vec<Product>> {
        let term_lower = term.to_lowercase();
        let catalog = self.catalog.read().unwrap();
        let mut hits: Vec<Product> = catalog
            .products
            .values()
            .filter(|p| p.product_number != exclude && contains_ci(&p.product_name, &term_lower))
            .cloned()
            .collect();
        by_name(&mut hits);
        hits.truncate(limit);
        Ok(hits)
    }

    async fn favorite_products(&self) -> Result<Vec<Product>> {
        let catalog = self.catalog.read().unwrap();
        let mut favorites: Vec<Product> = catalog
            .products
            .values()
            .filter(|p| p.is_favorite)
            .cloned()
            .collect();
        by_name(&mut favorites);
        Ok(favorites)
    }

    async fn adjust_store_stock(&self, barcode: &str, delta: i64) -> Result<Option<i64>> {
        let mut catalog = self.catalog.write().unwrap();
        Ok(catalog.variants.get_mut(barcode).map(|v| {
            v.store_stock = next_stock(v.store_stock, delta);
            v.store_stock
        }))
    }

    async fn toggle_favorite(&self, product_number: &str) -> Result<Option<bool>> {
        let mut catalog = self.catalog.write().unwrap();
        Ok(catalog.products.get_mut(product_number).map(|p| {
            p.is_favorite = !p.is_favorite;
            p.is_favorite
        }))
    }

    async fn replace_catalog(
        &self,
        products: &[Product],
        variants: &[Variant],
    ) -> Result<CatalogCounts> {
        let fresh = build_catalog(products, variants)?;
        let counts = CatalogCounts {
            products: fresh.products.len(),
            variants: fresh.variants.len(),
        };
        *self.catalog.write().unwrap() = fresh;
        Ok(counts)
    }

    async fn counts(&self) -> Result<CatalogCounts> {
        let catalog = self.catalog.read().unwrap();
        Ok(CatalogCounts {
            products: catalog.products.len(),
            variants: catalog.variants.len(),
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
