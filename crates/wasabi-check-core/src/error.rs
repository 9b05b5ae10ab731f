//! Typed errors for catalog operations.
//!
//! "Not found" and "ambiguous" are not errors: they are reported through
//! [`MatchOutcome`](crate::matcher::MatchOutcome) or `Option` results.
//! Everything here is either a rejected input (no state change) or a
//! storage failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("query text is empty")]
    EmptyQuery,

    #[error("barcode too short ({len} characters, need at least {min})")]
    BarcodeTooShort { len: usize, min: usize },

    #[error("product number candidate \"{candidate}\" too short ({len} characters, need at least {min})")]
    CandidateTooShort {
        candidate: String,
        len: usize,
        min: usize,
    },

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("invalid stock change {0}: must be +1 or -1")]
    InvalidDelta(i64),

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("image is empty")]
    EmptyImage,

    #[error("storage error: {0:#}")]
    Storage(#[source] anyhow::Error),

    #[error("transaction rolled back: {0:#}")]
    Transaction(#[source] anyhow::Error),

    #[error("OCR provider error: {0:#}")]
    Ocr(#[source] anyhow::Error),
}

impl CatalogError {
    /// True for rejected input: the caller sent something unusable and no
    /// state was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CatalogError::EmptyQuery
                | CatalogError::BarcodeTooShort { .. }
                | CatalogError::CandidateTooShort { .. }
                | CatalogError::MissingColumns(_)
                | CatalogError::InvalidDelta(_)
                | CatalogError::InvalidRow { .. }
                | CatalogError::UnsupportedFile(_)
                | CatalogError::EmptyImage
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_names_every_column() {
        let err = CatalogError::MissingColumns(vec!["barcode".into(), "size".into()]);
        assert_eq!(err.to_string(), "missing required columns: barcode, size");
        assert!(err.is_validation());
    }

    #[test]
    fn storage_errors_are_not_validation() {
        let err = CatalogError::Transaction(anyhow::anyhow!("disk full"));
        assert!(!err.is_validation());
        assert!(err.to_string().contains("disk full"));
    }
}
