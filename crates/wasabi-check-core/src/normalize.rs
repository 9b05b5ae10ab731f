//! Identifier canonicalization.
//!
//! Barcodes and product numbers are printed with hyphens, scanned with
//! stray whitespace, and typed in either case. Every comparison between a
//! stored identifier and a query goes through [`normalize`] on both sides.
//!
//! ```rust
//! use wasabi_check_core::normalize::normalize;
//!
//! assert_eq!(normalize(" m123-abc "), "M123ABC");
//! ```

/// Remove every `-`, trim surrounding whitespace, upper-case.
pub fn normalize(raw: &str) -> String {
    let without_hyphens: String = raw.chars().filter(|c| *c != '-').collect();
    without_hyphens.trim().to_uppercase()
}

/// Remove all whitespace, including interior runs.
pub fn compact(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}
