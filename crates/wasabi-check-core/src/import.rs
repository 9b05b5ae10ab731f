//! Catalog replacement from spreadsheet rows.
//!
//! An upload replaces the whole catalog. The rows are validated and turned
//! into a [`CatalogPlan`] first; only a plan that passed every check reaches
//! [`Store::replace_catalog`], which swaps the catalog in one transaction.
//!
//! # Algorithm
//!
//! 1. Every column in [`REQUIRED_COLUMNS`] must exist, else
//!    [`CatalogError::MissingColumns`].
//! 2. Products: rows with a non-empty `product_number`, first occurrence
//!    wins. `is_favorite` is optional and defaults to 0.
//! 3. Variants: rows with a non-empty `barcode`. Stock and price cells are
//!    coerced to non-negative integers.
//! 4. A variant pointing at no imported product, or a repeated barcode,
//!    fails the whole import with [`CatalogError::InvalidRow`].
//! 5. Delete all, insert all, one transaction.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::{CatalogError, Result};
use crate::models::{Product, Variant};
use crate::store::Store;

/// Columns every upload must carry.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "product_number",
    "product_name",
    "color",
    "barcode",
    "size",
    "release_year",
    "item_category",
    "original_price",
    "sale_price",
    "store_stock",
    "hq_stock",
];

/// Optional favorite flag column.
pub const FAVORITE_COLUMN: &str = "is_favorite";

/// One data row: column name → raw cell text.
#[derive(Debug, Clone, Default)]
pub struct SheetRow {
    /// 1-based spreadsheet row number, for error messages.
    pub line: usize,
    pub cells: HashMap<String, String>,
}

impl SheetRow {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            cells: HashMap::new(),
        }
    }

    /// Raw cell text; missing cells read as empty.
    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.insert(column.into(), value.into());
    }
}

/// A parsed worksheet: header columns in order plus data rows.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub columns: Vec<String>,
    pub rows: Vec<SheetRow>,
}

impl Sheet {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Validated catalog ready to be written.
#[derive(Debug, Clone, Default)]
pub struct CatalogPlan {
    pub products: Vec<Product>,
    pub variants: Vec<Variant>,
}

/// Counts written by a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub products: usize,
    pub variants: usize,
}

// ============ Cell coercion ============

/// Trimmed text, `None` when blank.
pub fn coerce_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Integer value of a cell. Spreadsheet numbers may arrive as `"2024"` or
/// `"2024.0"`; fractional values truncate toward zero. Blank or
/// non-numeric cells are `None`.
pub fn coerce_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(f.trunc() as i64),
        _ => None,
    }
}

/// Integer clamped at zero; blank or non-numeric is 0.
pub fn coerce_non_negative(raw: &str) -> i64 {
    coerce_int(raw).unwrap_or(0).max(0)
}

/// Non-zero integer means set; blank or non-numeric is unset.
pub fn coerce_flag(raw: &str) -> bool {
    coerce_int(raw).unwrap_or(0) != 0
}

// ============ Planning ============

/// Fail with every missing required column, in canonical order.
pub fn check_columns(sheet: &Sheet) -> Result<()> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !sheet.has_column(c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::MissingColumns(missing))
    }
}

/// Turn rows into a validated [`CatalogPlan`]. Pure: touches no store.
pub fn plan_catalog(sheet: &Sheet) -> Result<CatalogPlan> {
    check_columns(sheet)?;
    let has_favorite = sheet.has_column(FAVORITE_COLUMN);

    let mut plan = CatalogPlan::default();
    let mut seen_products: HashSet<String> = HashSet::new();

    for row in &sheet.rows {
        let Some(product_number) = coerce_text(row.get("product_number")) else {
            continue;
        };
        if !seen_products.insert(product_number.clone()) {
            continue;
        }
        plan.products.push(Product {
            product_number,
            product_name: row.get("product_name").trim().to_string(),
            is_favorite: has_favorite && coerce_flag(row.get(FAVORITE_COLUMN)),
            release_year: coerce_int(row.get("release_year")),
            item_category: coerce_text(row.get("item_category")),
        });
    }

    let mut seen_barcodes: HashSet<String> = HashSet::new();

    for row in &sheet.rows {
        let Some(barcode) = coerce_text(row.get("barcode")) else {
            continue;
        };
        let product_number = coerce_text(row.get("product_number")).ok_or_else(|| {
            CatalogError::InvalidRow {
                row: row.line,
                reason: format!("barcode {} has no product_number", barcode),
            }
        })?;
        if !seen_barcodes.insert(barcode.clone()) {
            return Err(CatalogError::InvalidRow {
                row: row.line,
                reason: format!("duplicate barcode {}", barcode),
            });
        }
        plan.variants.push(Variant {
            barcode,
            product_number,
            color: coerce_text(row.get("color")),
            size: coerce_text(row.get("size")),
            store_stock: coerce_non_negative(row.get("store_stock")),
            hq_stock: coerce_non_negative(row.get("hq_stock")),
            original_price: coerce_non_negative(row.get("original_price")),
            sale_price: coerce_non_negative(row.get("sale_price")),
        });
    }

    Ok(plan)
}

/// Validate `sheet` and replace the whole catalog with it.
///
/// Validation failures leave the store untouched. A storage failure during
/// the swap is a [`CatalogError::Transaction`]; the backend guarantees the
/// previous catalog is still in place.
pub async fn replace_catalog<S: Store + ?Sized>(store: &S, sheet: &Sheet) -> Result<ImportSummary> {
    let plan = plan_catalog(sheet)?;
    let counts = store
        .replace_catalog(&plan.products, &plan.variants)
        .await
        .map_err(CatalogError::Transaction)?;
    Ok(ImportSummary {
        products: counts.products,
        variants: counts.variants,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogCounts;
    use crate::store::memory::InMemoryStore;

    fn sheet(columns: &[&str], rows: &[&[&str]]) -> Sheet {
        Sheet {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, values)| {
                    let mut row = SheetRow::new(i + 2);
                    for (c, v) in columns.iter().zip(values.iter()) {
                        row.set(*c, *v);
                    }
                    row
                })
                .collect(),
        }
    }

    fn full_sheet(rows: &[&[&str]]) -> Sheet {
        sheet(&REQUIRED_COLUMNS, rows)
    }

    #[test]
    fn coercions() {
        assert_eq!(coerce_int(" 2024 "), Some(2024));
        assert_eq!(coerce_int("2024.0"), Some(2024));
        assert_eq!(coerce_int("12.9"), Some(12));
        assert_eq!(coerce_int(""), None);
        assert_eq!(coerce_int("n/a"), None);
        assert_eq!(coerce_non_negative("-3"), 0);
        assert_eq!(coerce_non_negative("abc"), 0);
        assert_eq!(coerce_non_negative("7"), 7);
        assert!(coerce_flag("1"));
        assert!(!coerce_flag("yes"));
        assert_eq!(coerce_text("  "), None);
    }

    #[test]
    fn missing_columns_listed_in_order() {
        let cols: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| *c != "barcode" && *c != "hq_stock")
            .collect();
        let err = plan_catalog(&sheet(&cols, &[])).unwrap_err();
        match err {
            CatalogError::MissingColumns(missing) => {
                assert_eq!(missing, vec!["barcode", "hq_stock"])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn shared_product_number_yields_one_product_two_variants() {
        let plan = plan_catalog(&full_sheet(&[
            &["M1", "Tee", "WHITE", "111", "S", "2024", "TOP", "10000", "9000", "1", "5"],
            &["M1", "Tee (dup)", "WHITE", "112", "M", "2024", "TOP", "10000", "9000", "2", "5"],
        ]))
        .unwrap();
        assert_eq!(plan.products.len(), 1);
        assert_eq!(plan.products[0].product_name, "Tee");
        assert_eq!(plan.variants.len(), 2);
    }

    #[test]
    fn blank_identifiers_dropped_and_defaults_applied() {
        let plan = plan_catalog(&full_sheet(&[
            &["", "Ghost", "", "", "", "", "", "", "", "", ""],
            &["M2", "Pants", "", "", "", "soon", "", "", "", "", ""],
            &["M2", "Pants", "", "221", "", "", "", "x", "", "-4", ""],
        ]))
        .unwrap();
        assert_eq!(plan.products.len(), 1);
        let product = &plan.products[0];
        assert_eq!(product.release_year, None);
        assert_eq!(product.item_category, None);
        assert!(!product.is_favorite);

        assert_eq!(plan.variants.len(), 1);
        let v = &plan.variants[0];
        assert_eq!(v.original_price, 0);
        assert_eq!(v.store_stock, 0);
        assert_eq!(v.color, None);
    }

    #[test]
    fn favorite_column_is_optional_and_coerced() {
        let mut cols: Vec<&str> = REQUIRED_COLUMNS.to_vec();
        cols.push(FAVORITE_COLUMN);
        let plan = plan_catalog(&sheet(
            &cols,
            &[
                &["M1", "A", "", "", "", "", "", "", "", "", "", "1"],
                &["M2", "B", "", "", "", "", "", "", "", "", "", "abc"],
                &["M3", "C", "", "", "", "", "", "", "", "", "", ""],
            ],
        ))
        .unwrap();
        let flags: Vec<bool> = plan.products.iter().map(|p| p.is_favorite).collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn variant_without_product_number_fails_row() {
        let err = plan_catalog(&full_sheet(&[&[
            "", "Orphan", "", "999", "", "", "", "", "", "", "",
        ]]))
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRow { row: 2, .. }));
    }

    #[test]
    fn duplicate_barcode_fails_row() {
        let err = plan_catalog(&full_sheet(&[
            &["M1", "Tee", "", "111", "", "", "", "", "", "", ""],
            &["M1", "Tee", "", "111", "", "", "", "", "", "", ""],
        ]))
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRow { row: 3, .. }));
    }

    #[tokio::test]
    async fn schema_error_leaves_store_untouched() {
        let store = InMemoryStore::new();
        replace_catalog(
            &store,
            &full_sheet(&[&["M1", "Tee", "", "111", "", "", "", "", "", "", ""]]),
        )
        .await
        .unwrap();

        let without_barcode: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| *c != "barcode")
            .collect();
        let err = replace_catalog(&store, &sheet(&without_barcode, &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::MissingColumns(_)));
        assert_eq!(
            store.counts().await.unwrap(),
            CatalogCounts {
                products: 1,
                variants: 1
            }
        );
    }

    #[tokio::test]
    async fn import_replaces_previous_catalog() {
        let store = InMemoryStore::new();
        replace_catalog(
            &store,
            &full_sheet(&[&["OLD", "Old", "", "000", "", "", "", "", "", "", ""]]),
        )
        .await
        .unwrap();
        let summary = replace_catalog(
            &store,
            &full_sheet(&[
                &["M1", "Tee", "", "111", "", "", "", "", "", "", ""],
                &["M1", "Tee", "", "112", "", "", "", "", "", "", ""],
            ]),
        )
        .await
        .unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                products: 1,
                variants: 2
            }
        );
        assert!(store.get_product("OLD").await.unwrap().is_none());
    }
}
