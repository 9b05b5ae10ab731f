//! Photographed-label lookup.
//!
//! A [`TextRecognizer`] turns image bytes into text; which engine does that
//! is the application's choice. [`recognize_and_match`] then extracts
//! product-number candidates and matches the first one.

use anyhow::Result as AnyResult;
use async_trait::async_trait;

use crate::candidates::CandidateExtractor;
use crate::error::{CatalogError, Result};
use crate::matcher::{match_candidate, MatchOutcome, MatchRules};
use crate::store::Store;

/// OCR backend: image bytes in, recognized text out.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Short identifier for logs (e.g. `"google-vision"`).
    fn name(&self) -> &str;

    /// Full recognized text. An image without text yields an empty string.
    async fn recognize(&self, image: &[u8]) -> AnyResult<String>;
}

/// What a label photo resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrLookup {
    /// The recognizer found no text at all.
    NoText,
    /// Text was found but nothing looks like a product number.
    NoCandidate { text: String },
    /// The first candidate was matched; all candidates are kept for a
    /// fallback picker.
    Matched {
        candidate: String,
        candidates: Vec<String>,
        outcome: MatchOutcome,
    },
}

/// Recognize `image`, extract candidates, match the first.
pub async fn recognize_and_match<S, R>(
    recognizer: &R,
    store: &S,
    extractor: &CandidateExtractor,
    rules: &MatchRules,
    image: &[u8],
) -> Result<OcrLookup>
where
    S: Store + ?Sized,
    R: TextRecognizer + ?Sized,
{
    if image.is_empty() {
        return Err(CatalogError::EmptyImage);
    }
    let text = recognizer
        .recognize(image)
        .await
        .map_err(CatalogError::Ocr)?;
    lookup_text(store, extractor, rules, &text).await
}

/// The text half of [`recognize_and_match`].
pub async fn lookup_text<S: Store + ?Sized>(
    store: &S,
    extractor: &CandidateExtractor,
    rules: &MatchRules,
    text: &str,
) -> Result<OcrLookup> {
    if text.trim().is_empty() {
        return Ok(OcrLookup::NoText);
    }
    let candidates = extractor.extract(text);
    let Some(first) = candidates.first().cloned() else {
        return Ok(OcrLookup::NoCandidate {
            text: text.to_string(),
        });
    };
    let outcome = match_candidate(store, rules, &first).await?;
    Ok(OcrLookup::Matched {
        candidate: first,
        candidates,
        outcome,
    })
}

/// Recognizer used when OCR is not configured; every call fails.
pub struct DisabledRecognizer;

#[async_trait]
impl TextRecognizer for DisabledRecognizer {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn recognize(&self, _image: &[u8]) -> AnyResult<String> {
        anyhow::bail!("OCR provider is disabled")
    }
}
