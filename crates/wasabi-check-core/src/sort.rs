//! Variant display order.
//!
//! Variants are grouped by color, then ordered by size. Sizes are free text
//! in the catalog, so each one is ranked into one of three tiers:
//!
//! | Tier | Sizes | Ordered by |
//! |------|-------|------------|
//! | 1 | all digits (`90`, `100`) | numeric value |
//! | 2 | `XXS XS S M L XL XXL XXXL` | position in that list |
//! | 3 | anything else (`FREE`, `28-30`) | the normalized text |
//!
//! `2XS`, `2XL` and `3XL` are read as `XXS`, `XXL` and `XXXL`.

use std::cmp::Ordering;

use crate::models::Variant;

const LETTER_SIZES: [&str; 8] = ["XXS", "XS", "S", "M", "L", "XL", "XXL", "XXXL"];

/// Upper-cased, trimmed size with synonyms folded.
pub fn normalize_size(size: &str) -> String {
    let upper = size.trim().to_uppercase();
    match upper.as_str() {
        "2XS" => "XXS".to_string(),
        "2XL" => "XXL".to_string(),
        "3XL" => "XXXL".to_string(),
        _ => upper,
    }
}

/// Position of a size within its tier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SizeRank {
    tier: u8,
    position: u128,
    raw: String,
}

impl SizeRank {
    pub fn of(size: Option<&str>) -> Self {
        let raw = normalize_size(size.unwrap_or(""));
        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            // Digit runs longer than u128 saturate; the raw string still breaks the tie.
            let position = raw.parse::<u128>().unwrap_or(u128::MAX);
            return Self {
                tier: 1,
                position,
                raw: String::new(),
            };
        }
        if let Some(idx) = LETTER_SIZES.iter().position(|s| *s == raw) {
            return Self {
                tier: 2,
                position: idx as u128,
                raw: String::new(),
            };
        }
        Self {
            tier: 3,
            position: 0,
            raw,
        }
    }

    pub fn tier(&self) -> u8 {
        self.tier
    }
}

/// Total display order: `(color, size tier, position, size text)`.
pub fn compare_variants(a: &Variant, b: &Variant) -> Ordering {
    let color_a = a.color.as_deref().unwrap_or("");
    let color_b = b.color.as_deref().unwrap_or("");
    color_a
        .cmp(color_b)
        .then_with(|| SizeRank::of(a.size.as_deref()).cmp(&SizeRank::of(b.size.as_deref())))
}

/// Sort in place. Stable, so equal keys keep their input order.
pub fn sort_variants(variants: &mut [Variant]) {
    variants.sort_by(compare_variants);
}
