//! TOML configuration parsing and validation.
//!
//! Every section except `[db]` and `[server]` is optional and falls back to
//! the defaults below.
//!
//! ```toml
//! [db]
//! path = "./data/wck.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:5000"
//! max_upload_bytes = 16777216
//!
//! [matching]
//! min_barcode_len = 11
//! min_candidate_len = 5
//! candidate_prefix = "M"
//!
//! [catalog]
//! image_url_prefix = "https://files.ebizway.co.kr/files/10249/Style/"
//! related_limit = 5
//!
//! [ocr]
//! provider = "google"            # or "disabled"
//! api_key_env = "GOOGLE_VISION_API_KEY"
//!
//! [keepalive]
//! interval_secs = 240            # 0 disables
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use wasabi_check_core::candidates::CandidateExtractor;
use wasabi_check_core::catalog::DetailOptions;
use wasabi_check_core::matcher::{MatchRules, DEFAULT_MIN_BARCODE_LEN, DEFAULT_MIN_CANDIDATE_LEN};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub keepalive: KeepaliveConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    #[serde(default = "default_min_barcode_len")]
    pub min_barcode_len: usize,
    #[serde(default = "default_min_candidate_len")]
    pub min_candidate_len: usize,
    #[serde(default = "default_candidate_prefix")]
    pub candidate_prefix: String,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_barcode_len: default_min_barcode_len(),
            min_candidate_len: default_min_candidate_len(),
            candidate_prefix: default_candidate_prefix(),
        }
    }
}

fn default_min_barcode_len() -> usize {
    DEFAULT_MIN_BARCODE_LEN
}
fn default_min_candidate_len() -> usize {
    DEFAULT_MIN_CANDIDATE_LEN
}
fn default_candidate_prefix() -> String {
    "M".to_string()
}

impl MatchingConfig {
    pub fn rules(&self) -> MatchRules {
        MatchRules {
            min_barcode_len: self.min_barcode_len,
            min_candidate_len: self.min_candidate_len,
        }
    }

    pub fn extractor(&self) -> Result<CandidateExtractor> {
        CandidateExtractor::new(&self.candidate_prefix)
            .with_context(|| format!("invalid candidate_prefix: {}", self.candidate_prefix))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_image_url_prefix")]
    pub image_url_prefix: String,
    #[serde(default = "default_related_limit")]
    pub related_limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            image_url_prefix: default_image_url_prefix(),
            related_limit: default_related_limit(),
        }
    }
}

fn default_image_url_prefix() -> String {
    "https://files.ebizway.co.kr/files/10249/Style/".to_string()
}
fn default_related_limit() -> usize {
    5
}

impl CatalogConfig {
    pub fn detail_options(&self) -> DetailOptions {
        DetailOptions {
            image_url_prefix: self.image_url_prefix.clone(),
            related_limit: self.related_limit,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_provider")]
    pub provider: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_ocr_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            provider: default_ocr_provider(),
            api_key_env: default_api_key_env(),
            endpoint: default_ocr_endpoint(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_ocr_provider() -> String {
    "disabled".to_string()
}
fn default_api_key_env() -> String {
    "GOOGLE_VISION_API_KEY".to_string()
}
fn default_ocr_endpoint() -> String {
    "https://vision.googleapis.com/v1/images:annotate".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}

impl OcrConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct KeepaliveConfig {
    #[serde(default = "default_keepalive_secs")]
    pub interval_secs: u64,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_keepalive_secs(),
        }
    }
}

fn default_keepalive_secs() -> u64 {
    240
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.server.max_upload_bytes == 0 {
        anyhow::bail!("server.max_upload_bytes must be > 0");
    }

    if config.matching.min_barcode_len == 0 {
        anyhow::bail!("matching.min_barcode_len must be >= 1");
    }
    if config.matching.min_candidate_len == 0 {
        anyhow::bail!("matching.min_candidate_len must be >= 1");
    }
    let prefix = config.matching.candidate_prefix.trim();
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        anyhow::bail!(
            "matching.candidate_prefix must be non-empty ASCII letters or digits, got '{}'",
            config.matching.candidate_prefix
        );
    }

    match config.ocr.provider.as_str() {
        "disabled" | "google" => {}
        other => anyhow::bail!(
            "Unknown OCR provider: '{}'. Must be disabled or google.",
            other
        ),
    }
    if config.ocr.is_enabled() && config.ocr.api_key_env.trim().is_empty() {
        anyhow::bail!("ocr.api_key_env must be set when provider is '{}'", config.ocr.provider);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &str) -> Result<Config> {
        let content = format!(
            "[db]\npath = \"/tmp/wck.sqlite\"\n\n[server]\nbind = \"127.0.0.1:0\"\n{}",
            extra
        );
        let config: Config = toml::from_str(&content)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.server.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(cfg.matching.rules(), MatchRules::default());
        assert_eq!(cfg.matching.candidate_prefix, "M");
        assert_eq!(cfg.catalog.related_limit, 5);
        assert!(!cfg.ocr.is_enabled());
        assert_eq!(cfg.keepalive.interval_secs, 240);
    }

    #[test]
    fn overrides_apply() {
        let cfg = parse("[matching]\nmin_barcode_len = 8\ncandidate_prefix = \"K\"\n").unwrap();
        assert_eq!(cfg.matching.min_barcode_len, 8);
        assert_eq!(cfg.matching.min_candidate_len, 5);
        let extractor = cfg.matching.extractor().unwrap();
        assert_eq!(extractor.extract("K1234"), vec!["K1234"]);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse("[matching]\nmin_barcode_len = 0\n").is_err());
        assert!(parse("[matching]\ncandidate_prefix = \"\"\n").is_err());
        assert!(parse("[matching]\ncandidate_prefix = \"M.*\"\n").is_err());
        assert!(parse("[ocr]\nprovider = \"tesseract\"\n").is_err());
        assert!(parse("[server]\n").is_err());
    }
}
