//! Product detail for `wck show`, plus the shared terminal renderers used
//! by the lookup commands.

use anyhow::Result;

use wasabi_check_core::catalog::{self, Listing, ProductDetail};
use wasabi_check_core::models::{Product, Variant};

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// CLI entry point: print one product with its variants and related products.
pub async fn run_show(config: &Config, product_number: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    print_product(config, &store, product_number).await
}

pub(crate) async fn print_product(
    config: &Config,
    store: &SqliteStore,
    product_number: &str,
) -> Result<()> {
    let detail =
        catalog::product_detail(store, product_number, &config.catalog.detail_options())
            .await?
            .ok_or_else(|| anyhow::anyhow!("product not found: {}", product_number))?;
    print_detail(&detail);
    Ok(())
}

pub(crate) fn print_detail(detail: &ProductDetail) {
    let p = &detail.product;
    println!("--- Product ---");
    println!("number:    {}{}", p.product_number, favorite_mark(p));
    println!("name:      {}", p.product_name);
    if let Some(ref category) = p.item_category {
        println!("category:  {}", category);
    }
    if let Some(year) = p.release_year {
        println!("released:  {}", year);
    }
    println!("image:     {}", detail.image_url);
    println!();

    println!("--- Variants ({}) ---", detail.variants.len());
    print_variants(&detail.variants);

    if !detail.related.is_empty() {
        println!();
        println!("--- Related ---");
        for r in &detail.related {
            print_product_line(r);
        }
    }
}

pub(crate) fn print_listing(listing: &Listing) {
    if listing.showing_favorites {
        println!("Favorites ({}):", listing.products.len());
    } else {
        println!(
            "Results for '{}' ({}):",
            listing.query,
            listing.products.len()
        );
    }
    for entry in &listing.products {
        print_product_line(&entry.product);
        print_variants(&entry.variants);
    }
}

fn print_product_line(p: &Product) {
    println!("  {:<16} {}{}", p.product_number, p.product_name, favorite_mark(p));
}

fn print_variants(variants: &[Variant]) {
    for v in variants {
        println!(
            "    {:<16} {:<10} {:<6} store {:>3}  hq {:>3}  {:>8}",
            v.barcode,
            v.color.as_deref().unwrap_or("-"),
            v.size.as_deref().unwrap_or("-"),
            v.store_stock,
            v.hq_stock,
            v.sale_price
        );
    }
}

fn favorite_mark(p: &Product) -> &'static str {
    if p.is_favorite {
        " ★"
    } else {
        ""
    }
}
