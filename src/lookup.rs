//! Lookup commands: `wck scan`, `wck search`, `wck ocr`, `wck list`.
//!
//! A single match prints the product detail; several matches print the
//! search listing for the echoed query.

use std::path::Path;

use anyhow::{bail, Context, Result};

use wasabi_check_core::catalog;
use wasabi_check_core::matcher::{self, MatchOutcome};
use wasabi_check_core::ocr::{recognize_and_match, OcrLookup};

use crate::config::Config;
use crate::ocr::create_recognizer;
use crate::show::{print_listing, print_product};
use crate::sqlite_store::SqliteStore;

pub async fn run_scan(config: &Config, barcode: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let outcome = matcher::match_barcode(&store, &config.matching.rules(), barcode).await?;
    report(config, &store, outcome).await
}

pub async fn run_search(config: &Config, text: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let outcome = matcher::match_text(&store, text).await?;
    report(config, &store, outcome).await
}

pub async fn run_list(config: &Config, query: Option<&str>) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let listing = catalog::browse(&store, query.unwrap_or_default()).await?;
    print_listing(&listing);
    Ok(())
}

/// Recognize a label photo with the configured provider and look it up.
pub async fn run_ocr(config: &Config, image_path: &Path) -> Result<()> {
    let image = std::fs::read(image_path)
        .with_context(|| format!("Failed to read image: {}", image_path.display()))?;
    let recognizer = create_recognizer(&config.ocr)?;
    let store = SqliteStore::open(config).await?;

    let lookup = recognize_and_match(
        recognizer.as_ref(),
        &store,
        &config.matching.extractor()?,
        &config.matching.rules(),
        &image,
    )
    .await?;

    match lookup {
        OcrLookup::NoText => bail!("no text recognized in {}", image_path.display()),
        OcrLookup::NoCandidate { text } => {
            println!("--- Recognized text ---");
            println!("{}", text.trim());
            println!();
            bail!("no product number found in label text")
        }
        OcrLookup::Matched {
            candidate,
            candidates,
            outcome,
        } => {
            println!("Candidate: {}", candidate);
            if candidates.len() > 1 {
                println!("Others:    {}", candidates[1..].join(", "));
            }
            println!();
            report(config, &store, outcome).await
        }
    }
}

async fn report(config: &Config, store: &SqliteStore, outcome: MatchOutcome) -> Result<()> {
    match outcome {
        MatchOutcome::NotFound => bail!("no matching product"),
        MatchOutcome::FoundOne { product_number } => {
            print_product(config, store, &product_number).await
        }
        MatchOutcome::FoundMany { query } => {
            let listing = catalog::browse(store, &query).await?;
            print_listing(&listing);
            Ok(())
        }
    }
}
