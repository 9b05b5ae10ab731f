//! # Wasabi Check Core
//!
//! Storage-agnostic logic for Wasabi Check: catalog models, identifier
//! normalization, barcode / text / OCR matching, variant display order,
//! catalog import reconciliation, and the [`store::Store`] trait.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem dependencies.
//! Backends and OCR providers are injected by the calling application.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | `Product`, `Variant` and view types |
//! | [`normalize`] | Identifier canonicalization |
//! | [`candidates`] | Product-number candidates from OCR text |
//! | [`sort`] | Variant display order |
//! | [`matcher`] | Barcode, free-text and candidate matching |
//! | [`import`] | Spreadsheet rows → catalog replacement |
//! | [`inventory`] | Stock adjustment and favorite toggle |
//! | [`catalog`] | Browse listing and product detail |
//! | [`ocr`] | `TextRecognizer` trait and the recognize-then-match pipeline |
//! | [`store`] | Storage trait and in-memory backend |

pub mod candidates;
pub mod catalog;
pub mod error;
pub mod import;
pub mod inventory;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod ocr;
pub mod sort;
pub mod store;

pub use error::CatalogError;
pub use matcher::{MatchOutcome, MatchRules};
pub use models::{Product, Variant};
pub use store::Store;
