//! Read views: the browse listing and the product detail page.

use serde::Serialize;

use crate::error::{CatalogError, Result};
use crate::matcher::search_text;
use crate::models::{Product, ProductWithVariants, Variant};
use crate::sort::sort_variants;
use crate::store::Store;

/// Browse listing: search hits, or favorites when there is no query.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub query: String,
    pub showing_favorites: bool,
    pub products: Vec<ProductWithVariants>,
}

/// Everything the detail page shows for one product.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    pub image_url: String,
    pub variants: Vec<Variant>,
    pub related: Vec<Product>,
}

/// Knobs for [`product_detail`].
#[derive(Debug, Clone)]
pub struct DetailOptions {
    /// Image URL is `image_url_prefix + product_number + ".jpg"`.
    pub image_url_prefix: String,
    pub related_limit: usize,
}

impl Default for DetailOptions {
    fn default() -> Self {
        Self {
            image_url_prefix: String::new(),
            related_limit: 5,
        }
    }
}

/// Search hits for a non-blank query (variants not loaded), otherwise the
/// favorites with their variants in display order.
pub async fn browse<S: Store + ?Sized>(store: &S, query: &str) -> Result<Listing> {
    if !query.trim().is_empty() {
        let products = search_text(store, query).await?;
        return Ok(Listing {
            query: query.to_string(),
            showing_favorites: false,
            products: products
                .into_iter()
                .map(|product| ProductWithVariants {
                    product,
                    variants: Vec::new(),
                })
                .collect(),
        });
    }

    let favorites = store
        .favorite_products()
        .await
        .map_err(CatalogError::Storage)?;
    let mut products = Vec::with_capacity(favorites.len());
    for product in favorites {
        let variants = sorted_variants(store, &product.product_number).await?;
        products.push(ProductWithVariants { product, variants });
    }
    Ok(Listing {
        query: String::new(),
        showing_favorites: true,
        products,
    })
}

/// Detail view, or `None` for an unknown product number.
pub async fn product_detail<S: Store + ?Sized>(
    store: &S,
    product_number: &str,
    options: &DetailOptions,
) -> Result<Option<ProductDetail>> {
    let Some(product) = store
        .get_product(product_number)
        .await
        .map_err(CatalogError::Storage)?
    else {
        return Ok(None);
    };

    let variants = sorted_variants(store, &product.product_number).await?;

    let related = match related_term(&product.product_name) {
        Some(term) if options.related_limit > 0 => store
            .products_with_name_containing(term, &product.product_number, options.related_limit)
            .await
            .map_err(CatalogError::Storage)?,
        _ => Vec::new(),
    };

    Ok(Some(ProductDetail {
        image_url: format!("{}{}.jpg", options.image_url_prefix, product.product_number),
        product,
        variants,
        related,
    }))
}

/// Last space-separated word of a product name, if longer than one
/// character. Names usually end with the garment type ("... Shirt").
pub fn related_term(product_name: &str) -> Option<&str> {
    let last = product_name.split(' ').next_back()?;
    (last.chars().count() > 1).then_some(last)
}

async fn sorted_variants<S: Store + ?Sized>(store: &S, product_number: &str) -> Result<Vec<Variant>> {
    let mut variants = store
        .variants_of(product_number)
        .await
        .map_err(CatalogError::Storage)?;
    sort_variants(&mut variants);
    Ok(variants)
}
