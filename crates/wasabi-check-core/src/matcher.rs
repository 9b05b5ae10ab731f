//! Barcode, free-text, and OCR-candidate matching.
//!
//! Each entry point turns an ambiguous input into a [`MatchOutcome`]:
//! nothing, exactly one product, or several products (the caller shows a
//! disambiguation list seeded with the echoed query).
//!
//! Barcodes and product numbers are hierarchical, so scanned and recognized
//! identifiers use *prefix* matching on normalized keys. Typed text has no
//! such structure and uses case-insensitive *substring* matching.

use serde::Serialize;

use crate::error::{CatalogError, Result};
use crate::models::Product;
use crate::normalize::{compact, normalize};
use crate::store::Store;

/// Default minimum normalized barcode length.
pub const DEFAULT_MIN_BARCODE_LEN: usize = 11;
/// Default minimum normalized candidate length.
pub const DEFAULT_MIN_CANDIDATE_LEN: usize = 5;

/// Length thresholds applied before any store query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRules {
    pub min_barcode_len: usize,
    pub min_candidate_len: usize,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            min_barcode_len: DEFAULT_MIN_BARCODE_LEN,
            min_candidate_len: DEFAULT_MIN_CANDIDATE_LEN,
        }
    }
}

/// Result of a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchOutcome {
    NotFound,
    FoundOne { product_number: String },
    FoundMany { query: String },
}

impl MatchOutcome {
    /// Classify a result set by size, echoing `query` for the many case.
    pub fn from_products(products: &[Product], query: &str) -> Self {
        match products {
            [] => MatchOutcome::NotFound,
            [only] => MatchOutcome::FoundOne {
                product_number: only.product_number.clone(),
            },
            _ => MatchOutcome::FoundMany {
                query: query.to_string(),
            },
        }
    }
}

/// Match a scanned barcode by normalized prefix.
///
/// Scanners may append check digits or truncate, so the scanned value only
/// needs to be a prefix of the stored barcode. Returns the owning product of
/// the first matching variant; never [`MatchOutcome::FoundMany`].
pub async fn match_barcode<S: Store + ?Sized>(
    store: &S,
    rules: &MatchRules,
    scanned: &str,
) -> Result<MatchOutcome> {
    let key = normalize(scanned);
    let len = key.chars().count();
    if len < rules.min_barcode_len {
        return Err(CatalogError::BarcodeTooShort {
            len,
            min: rules.min_barcode_len,
        });
    }

    let hit = store
        .first_variant_with_barcode_prefix(&key)
        .await
        .map_err(CatalogError::Storage)?;

    Ok(match hit {
        Some(variant) => MatchOutcome::FoundOne {
            product_number: variant.product_number,
        },
        None => MatchOutcome::NotFound,
    })
}

/// Match free text against product numbers and names.
///
/// The text is also tried against product numbers with its whitespace
/// removed (`"M24 TS 001"` finds `M24TS001`). `FoundMany` echoes `text`
/// exactly as received.
pub async fn match_text<S: Store + ?Sized>(store: &S, text: &str) -> Result<MatchOutcome> {
    let products = search_text(store, text).await?;
    Ok(MatchOutcome::from_products(&products, text))
}

/// The product list behind [`match_text`], ordered by name.
pub async fn search_text<S: Store + ?Sized>(store: &S, text: &str) -> Result<Vec<Product>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::EmptyQuery);
    }
    let squeezed = compact(trimmed);
    let compact_arg = (squeezed != trimmed).then_some(squeezed.as_str());

    store
        .search_products(trimmed, compact_arg)
        .await
        .map_err(CatalogError::Storage)
}

/// Match an OCR candidate by normalized product-number prefix.
///
/// `FoundMany` echoes the candidate as extracted.
pub async fn match_candidate<S: Store + ?Sized>(
    store: &S,
    rules: &MatchRules,
    candidate: &str,
) -> Result<MatchOutcome> {
    let key = normalize(candidate);
    let len = key.chars().count();
    if len < rules.min_candidate_len {
        return Err(CatalogError::CandidateTooShort {
            candidate: candidate.to_string(),
            len,
            min: rules.min_candidate_len,
        });
    }

    let products = store
        .products_with_number_prefix(&key)
        .await
        .map_err(CatalogError::Storage)?;
    Ok(MatchOutcome::from_products(&products, candidate))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Variant;
    use crate::store::memory::InMemoryStore;

    pub(crate) fn product(number: &str, name: &str) -> Product {
        Product {
            product_number: number.to_string(),
            product_name: name.to_string(),
            is_favorite: false,
            release_year: Some(2024),
            item_category: Some("TOP".to_string()),
        }
    }

    pub(crate) fn variant(barcode: &str, number: &str, color: &str, size: &str) -> Variant {
        Variant {
            barcode: barcode.to_string(),
            product_number: number.to_string(),
            color: Some(color.to_string()),
            size: Some(size.to_string()),
            store_stock: 2,
            hq_stock: 10,
            original_price: 39000,
            sale_price: 29000,
        }
    }

    pub(crate) async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .replace_catalog(
                &[
                    product("M24-TS-001", "Linen Shirt"),
                    product("M24-TS-002", "Oxford Shirt"),
                    product("M24-PT-100", "Wide Pants"),
                    product("W23-SK-010", "Pleated Skirt"),
                ],
                &[
                    variant("8801-2345-67890", "M24-TS-001", "WHITE", "M"),
                    variant("8801-2345-67891", "M24-TS-001", "WHITE", "L"),
                    variant("8801-2345-68000", "M24-TS-002", "BLUE", "M"),
                    variant("8809-9999-00001", "M24-PT-100", "BLACK", "30"),
                    variant("8809-9999-00002", "W23-SK-010", "BEIGE", "FREE"),
                ],
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn barcode_prefix_finds_owner() {
        let store = seeded().await;
        let outcome = match_barcode(&store, &MatchRules::default(), "88012345-678")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            MatchOutcome::FoundOne {
                product_number: "M24-TS-001".to_string()
            }
        );
    }

    #[tokio::test]
    async fn full_barcode_with_whitespace_matches() {
        let store = seeded().await;
        let outcome = match_barcode(&store, &MatchRules::default(), " 8809999900002 ")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            MatchOutcome::FoundOne {
                product_number: "W23-SK-010".to_string()
            }
        );
    }

    #[tokio::test]
    async fn short_barcode_rejected_regardless_of_contents() {
        let store = seeded().await;
        let err = match_barcode(&store, &MatchRules::default(), "8801-2345-6")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::BarcodeTooShort { len: 9, min: 11 }));

        let empty = InMemoryStore::new();
        assert!(match_barcode(&empty, &MatchRules::default(), "")
            .await
            .unwrap_err()
            .is_validation());
    }

    #[tokio::test]
    async fn unknown_barcode_not_found() {
        let store = seeded().await;
        let outcome = match_barcode(&store, &MatchRules::default(), "12345678901")
            .await
            .unwrap();
        assert_eq!(outcome, MatchOutcome::NotFound);
    }

    #[tokio::test]
    async fn text_two_names_found_many_echoes_query() {
        let store = seeded().await;
        let outcome = match_text(&store, "shirt").await.unwrap();
        assert_eq!(
            outcome,
            MatchOutcome::FoundMany {
                query: "shirt".to_string()
            }
        );
    }

    #[tokio::test]
    async fn text_single_hit_and_miss() {
        let store = seeded().await;
        assert_eq!(
            match_text(&store, "pleated").await.unwrap(),
            MatchOutcome::FoundOne {
                product_number: "W23-SK-010".to_string()
            }
        );
        assert_eq!(
            match_text(&store, "jacket").await.unwrap(),
            MatchOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn text_with_accidental_spaces_matches_number() {
        let store = seeded().await;
        assert_eq!(
            match_text(&store, "pt- 100").await.unwrap(),
            MatchOutcome::FoundOne {
                product_number: "M24-PT-100".to_string()
            }
        );
    }

    #[tokio::test]
    async fn text_results_are_deduplicated() {
        let store = seeded().await;
        // Only the compacted form "ts-001" hits.
        let products = search_text(&store, "ts-0 01").await.unwrap();
        assert_eq!(products.len(), 1);
    }

    #[tokio::test]
    async fn blank_text_rejected() {
        let store = seeded().await;
        assert!(matches!(
            match_text(&store, "   ").await.unwrap_err(),
            CatalogError::EmptyQuery
        ));
    }

    #[tokio::test]
    async fn candidate_prefix_many_and_one() {
        let store = seeded().await;
        let rules = MatchRules::default();
        assert_eq!(
            match_candidate(&store, &rules, "M24-TS").await.unwrap(),
            MatchOutcome::FoundMany {
                query: "M24-TS".to_string()
            }
        );
        assert_eq!(
            match_candidate(&store, &rules, "m24pt1").await.unwrap(),
            MatchOutcome::FoundOne {
                product_number: "M24-PT-100".to_string()
            }
        );
        assert_eq!(
            match_candidate(&store, &rules, "M99-XX").await.unwrap(),
            MatchOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn short_candidate_rejected() {
        let store = seeded().await;
        let err = match_candidate(&store, &MatchRules::default(), "M2-4-T")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::CandidateTooShort { len: 4, .. }));
    }
}
