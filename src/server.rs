//! HTTP API.
//!
//! Serves the scanner front end: barcode, free-text and label-photo lookup,
//! browsing, product detail, stock and favorite mutations, and catalog
//! upload.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/products?query=` | Search results, or favorites when `query` is blank |
//! | `GET`  | `/products/{product_number}` | Product detail |
//! | `POST` | `/barcode_search` | `{barcode}` → match outcome |
//! | `POST` | `/text_search` | `{text}` → match outcome |
//! | `POST` | `/ocr_upload` | multipart `ocr_image` → match outcome plus candidates |
//! | `POST` | `/update_stock` | `{barcode, change}` with change ±1 |
//! | `POST` | `/toggle_favorite` | `{product_number}` |
//! | `POST` | `/import_excel` | multipart `excel_file` (.xlsx) → catalog replacement |
//!
//! # Error Contract
//!
//! ```json
//! { "status": "error", "message": "barcode too short (4 characters, need at least 11)" }
//! ```
//!
//! `status` is `error` for validation (400) and internal (500) failures and
//! `not_found` (404) for unknown barcodes and products and for searches
//! that match nothing. Lookup hits carry `found_one` or `found_many`.

use axum::{
    extract::{
        multipart::{Multipart, MultipartError},
        rejection::JsonRejection,
        DefaultBodyLimit, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use wasabi_check_core::candidates::CandidateExtractor;
use wasabi_check_core::catalog::{self, DetailOptions, Listing, ProductDetail};
use wasabi_check_core::error::CatalogError;
use wasabi_check_core::import::{self, ImportSummary};
use wasabi_check_core::inventory;
use wasabi_check_core::matcher::{self, MatchOutcome, MatchRules};
use wasabi_check_core::ocr::{recognize_and_match, OcrLookup, TextRecognizer};
use wasabi_check_core::store::Store;

use crate::config::Config;
use crate::keepalive;
use crate::ocr::create_recognizer;
use crate::spreadsheet;
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Store>,
    recognizer: Arc<dyn TextRecognizer>,
    rules: MatchRules,
    extractor: Arc<CandidateExtractor>,
    detail: Arc<DetailOptions>,
}

impl AppState {
    pub fn new(
        config: &Config,
        store: Arc<dyn Store>,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            store,
            recognizer,
            rules: config.matching.rules(),
            extractor: Arc::new(config.matching.extractor()?),
            detail: Arc::new(config.catalog.detail_options()),
        })
    }
}

/// Starts the HTTP server against the configured SQLite database.
///
/// Binds to `[server].bind`, starts the keep-alive task, and runs until
/// the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store: Arc<dyn Store> = Arc::new(SqliteStore::open(config).await?);
    let recognizer = create_recognizer(&config.ocr)?;
    tracing::info!(ocr = recognizer.name(), "text recognizer ready");

    let _keepalive = keepalive::spawn(store.clone(), config.keepalive.interval_secs);

    let app = router(config, AppState::new(config, store, recognizer)?);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    println!("Wasabi Check listening on http://{}", config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the router with every route and layer.
pub fn router(config: &Config, state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/products", get(handle_browse))
        .route("/products/{product_number}", get(handle_detail))
        .route("/barcode_search", post(handle_barcode_search))
        .route("/text_search", post(handle_text_search))
        .route("/ocr_upload", post(handle_ocr_upload))
        .route("/update_stock", post(handle_update_stock))
        .route("/toggle_favorite", post(handle_toggle_favorite))
        .route("/import_excel", post(handle_import_excel))
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    status: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "error",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "error",
        message: message.into(),
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        if err.is_validation() {
            return bad_request(err.to_string());
        }
        tracing::error!(error = %err, "request failed");
        internal_error(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError {
            status: rejection.status(),
            code: "error",
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError {
            status: err.status(),
            code: "error",
            message: err.body_text(),
        }
    }
}

type ApiResult<T> = Result<Json<T>, AppError>;

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /products ============

#[derive(Deserialize)]
struct BrowseParams {
    #[serde(default)]
    query: String,
}

async fn handle_browse(
    State(state): State<AppState>,
    Query(params): Query<BrowseParams>,
) -> ApiResult<Listing> {
    Ok(Json(catalog::browse(state.store.as_ref(), &params.query).await?))
}

async fn handle_detail(
    State(state): State<AppState>,
    Path(product_number): Path<String>,
) -> ApiResult<ProductDetail> {
    catalog::product_detail(state.store.as_ref(), &product_number, &state.detail)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(format!("product not found: {}", product_number)))
}

// ============ POST /barcode_search, /text_search ============

#[derive(Deserialize)]
struct BarcodeRequest {
    #[serde(default)]
    barcode: String,
}

async fn handle_barcode_search(
    State(state): State<AppState>,
    body: Result<Json<BarcodeRequest>, JsonRejection>,
) -> ApiResult<MatchOutcome> {
    let Json(req) = body?;
    let outcome = matcher::match_barcode(state.store.as_ref(), &state.rules, &req.barcode).await?;
    tracing::debug!(barcode = %req.barcode, ?outcome, "barcode search");
    found(outcome, || format!("no product with barcode {}", req.barcode.trim()))
}

/// `NotFound` is reported as a 404 error body; hits pass through.
fn found(outcome: MatchOutcome, miss: impl FnOnce() -> String) -> ApiResult<MatchOutcome> {
    match outcome {
        MatchOutcome::NotFound => Err(not_found(miss())),
        hit => Ok(Json(hit)),
    }
}

#[derive(Deserialize)]
struct TextRequest {
    #[serde(default)]
    text: String,
}

async fn handle_text_search(
    State(state): State<AppState>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> ApiResult<MatchOutcome> {
    let Json(req) = body?;
    let outcome = matcher::match_text(state.store.as_ref(), &req.text).await?;
    found(outcome, || format!("no product matching \"{}\"", req.text.trim()))
}

// ============ POST /ocr_upload ============

#[derive(Serialize)]
struct OcrResponse {
    #[serde(flatten)]
    outcome: MatchOutcome,
    candidate: String,
    candidates: Vec<String>,
}

async fn handle_ocr_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<OcrResponse> {
    let mut image = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("ocr_image") {
            image = Some(field.bytes().await?);
            break;
        }
    }
    let image = image.ok_or_else(|| bad_request("no image uploaded (field ocr_image)"))?;

    let lookup = recognize_and_match(
        state.recognizer.as_ref(),
        state.store.as_ref(),
        &state.extractor,
        &state.rules,
        &image,
    )
    .await?;
    tracing::info!(recognizer = state.recognizer.name(), ?lookup, "ocr lookup");

    match lookup {
        OcrLookup::NoText => Err(bad_request("no text recognized in image")),
        OcrLookup::NoCandidate { .. } => Err(bad_request(
            "no product number pattern found in recognized text",
        )),
        OcrLookup::Matched {
            candidate,
            candidates,
            outcome,
        } => {
            let Json(outcome) = found(outcome, || {
                format!("no product number starting with {}", candidate)
            })?;
            Ok(Json(OcrResponse {
                outcome,
                candidate,
                candidates,
            }))
        }
    }
}

// ============ POST /update_stock ============

#[derive(Deserialize)]
struct StockRequest {
    #[serde(default)]
    barcode: String,
    #[serde(default)]
    change: serde_json::Value,
}

#[derive(Serialize)]
struct StockResponse {
    status: &'static str,
    new_quantity: i64,
    barcode: String,
}

/// Front ends send `change` as either `1` or `"1"`.
fn parse_change(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().trim_start_matches('+').parse().ok(),
        _ => None,
    }
}

async fn handle_update_stock(
    State(state): State<AppState>,
    body: Result<Json<StockRequest>, JsonRejection>,
) -> ApiResult<StockResponse> {
    let Json(req) = body?;
    let delta = parse_change(&req.change)
        .ok_or_else(|| bad_request(format!("invalid change value: {}", req.change)))?;

    let level = inventory::adjust_stock(state.store.as_ref(), &req.barcode, delta)
        .await?
        .ok_or_else(|| not_found(format!("barcode not found: {}", req.barcode.trim())))?;
    tracing::info!(barcode = %level.barcode, delta, new_quantity = level.new_quantity, "stock adjusted");

    Ok(Json(StockResponse {
        status: "success",
        new_quantity: level.new_quantity,
        barcode: level.barcode,
    }))
}

// ============ POST /toggle_favorite ============

#[derive(Deserialize)]
struct FavoriteRequest {
    #[serde(default)]
    product_number: String,
}

#[derive(Serialize)]
struct FavoriteResponse {
    status: &'static str,
    new_favorite_status: bool,
}

async fn handle_toggle_favorite(
    State(state): State<AppState>,
    body: Result<Json<FavoriteRequest>, JsonRejection>,
) -> ApiResult<FavoriteResponse> {
    let Json(req) = body?;
    let flag = inventory::toggle_favorite(state.store.as_ref(), &req.product_number)
        .await?
        .ok_or_else(|| not_found(format!("product not found: {}", req.product_number.trim())))?;
    Ok(Json(FavoriteResponse {
        status: "success",
        new_favorite_status: flag,
    }))
}

// ============ POST /import_excel ============

#[derive(Serialize)]
struct ImportResponse {
    status: &'static str,
    #[serde(flatten)]
    summary: ImportSummary,
}

async fn handle_import_excel(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<ImportResponse> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("excel_file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            upload = Some((filename, field.bytes().await?));
            break;
        }
    }
    let (filename, bytes) = upload.ok_or_else(|| bad_request("no file uploaded (field excel_file)"))?;
    spreadsheet::ensure_xlsx_name(&filename)?;

    let sheet = run_blocking(move || spreadsheet::read_workbook(&bytes)).await??;

    let summary = import::replace_catalog(state.store.as_ref(), &sheet).await?;
    tracing::info!(
        file = %filename,
        products = summary.products,
        variants = summary.variants,
        "catalog replaced"
    );
    Ok(Json(ImportResponse {
        status: "success",
        summary,
    }))
}

/// Run CPU-bound work off the async threads. A panicked task is a 500.
async fn run_blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!(error = %e, "blocking task failed");
        internal_error(format!("background task failed: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn change_accepts_numbers_and_strings() {
        assert_eq!(parse_change(&json!(1)), Some(1));
        assert_eq!(parse_change(&json!(-1)), Some(-1));
        assert_eq!(parse_change(&json!("-1")), Some(-1));
        assert_eq!(parse_change(&json!(" +1 ")), Some(1));
        assert_eq!(parse_change(&json!("one")), None);
        assert_eq!(parse_change(&json!(1.5)), None);
        assert_eq!(parse_change(&serde_json::Value::Null), None);
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let err = AppError::from(CatalogError::InvalidDelta(3));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "error");

        let err = AppError::from(CatalogError::Storage(anyhow::anyhow!("disk gone")));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn misses_become_not_found() {
        let err = found(MatchOutcome::NotFound, || "nothing".to_string()).unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "not_found");
        assert_eq!(err.message, "nothing");

        let hit = MatchOutcome::FoundMany {
            query: "shirt".to_string(),
        };
        let Json(kept) = found(hit.clone(), || unreachable!()).unwrap();
        assert_eq!(kept, hit);
    }

    #[tokio::test]
    async fn panicked_reader_is_internal_error() {
        let err = run_blocking(|| -> u8 { panic!("reader blew up") })
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "error");

        assert_eq!(run_blocking(|| 7u8).await.unwrap(), 7);
    }

    #[test]
    fn ocr_response_flattens_status() {
        let body = serde_json::to_value(OcrResponse {
            outcome: MatchOutcome::FoundOne {
                product_number: "M24-TS-002".to_string(),
            },
            candidate: "M24-TS-002".to_string(),
            candidates: vec!["M24-TS-002".to_string()],
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "status": "found_one",
                "product_number": "M24-TS-002",
                "candidate": "M24-TS-002",
                "candidates": ["M24-TS-002"],
            })
        );
    }
}
