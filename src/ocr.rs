//! OCR providers.
//!
//! Implements [`TextRecognizer`] for:
//! - **[`DisabledRecognizer`]**: every call fails; used when `[ocr]` is not configured.
//! - **[`GoogleVisionRecognizer`]**: Google Cloud Vision `images:annotate`
//!   with `TEXT_DETECTION`, authenticated with an API key from the environment.
//!
//! Use [`create_recognizer`] to pick one from configuration.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use base64::Engine;

pub use wasabi_check_core::ocr::{DisabledRecognizer, TextRecognizer};

use crate::config::OcrConfig;

/// Build the recognizer named by `config.provider`.
pub fn create_recognizer(config: &OcrConfig) -> Result<Arc<dyn TextRecognizer>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledRecognizer)),
        "google" => Ok(Arc::new(GoogleVisionRecognizer::new(config)?)),
        other => bail!("Unknown OCR provider: {}", other),
    }
}

/// Text recognizer backed by the Google Cloud Vision REST API.
pub struct GoogleVisionRecognizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_retries: u32,
}

impl GoogleVisionRecognizer {
    /// # Errors
    ///
    /// Fails if the environment variable named by `api_key_env` is unset.
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", config.api_key_env))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl TextRecognizer for GoogleVisionRecognizer {
    fn name(&self) -> &str {
        "google-vision"
    }

    async fn recognize(&self, image: &[u8]) -> Result<String> {
        let body = request_body(image);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&self.endpoint)
                .query(&[("key", self.api_key.as_str())])
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_annotate_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        tracing::warn!(attempt, %status, "vision request failed, retrying");
                        last_err = Some(anyhow::anyhow!("Vision API error {}: {}", status, body_text));
                        continue;
                    }

                    bail!("Vision API error {}: {}", status, body_text);
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "vision request failed, retrying");
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Text recognition failed after retries")))
    }
}

fn request_body(image: &[u8]) -> serde_json::Value {
    serde_json::json!({
        "requests": [{
            "image": { "content": base64::engine::general_purpose::STANDARD.encode(image) },
            "features": [{ "type": "TEXT_DETECTION" }],
        }]
    })
}

/// Full text of the first annotation. A response without annotations is
/// an image without text and yields an empty string; a per-image `error`
/// object is a failure.
fn parse_annotate_response(json: &serde_json::Value) -> Result<String> {
    let first = json
        .get("responses")
        .and_then(|r| r.as_array())
        .and_then(|r| r.first())
        .ok_or_else(|| anyhow::anyhow!("Invalid Vision response: missing responses"))?;

    if let Some(message) = first
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        bail!("Vision API error: {}", message);
    }

    Ok(first
        .get("textAnnotations")
        .and_then(|a| a.as_array())
        .and_then(|a| a.first())
        .and_then(|a| a.get("description"))
        .and_then(|d| d.as_str())
        .unwrap_or_default()
        .to_string())
}
