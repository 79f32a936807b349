use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::FlyerError;
use crate::lexicon::Lexicon;
use crate::loader::{self, SUPPORTED_FORMATS};
use crate::orchestrator::{DocumentReport, Orchestrator, RawPage};
use crate::record::{CategoryLabel, ProductRecord};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<dyn OcrEngine>,
    pub lexicon: Arc<Lexicon>,
}

impl AppState {
    pub fn new(config: Config, engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            config: Arc::new(config),
            engine,
            lexicon: Arc::new(Lexicon::default()),
        }
    }
}

/// Extraction response
#[derive(Serialize)]
pub struct ExtractResponse {
    pub products: Vec<ProductRecord>,
    pub report: DocumentReport,
    pub processing_time_ms: u64,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub engine: String,
    pub supported_formats: Vec<String>,
    pub languages: Vec<String>,
    pub profiles: Vec<String>,
    pub max_file_size_bytes: usize,
    pub min_price: String,
    pub max_price: String,
    pub workers: usize,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let max_file_size = state.config.max_file_size;

    Router::new()
        .route("/extract", post(handle_extract))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .route("/categories", get(handle_categories))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config, engine: Arc<dyn OcrEngine>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let app = router(AppState::new(config, engine));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Handle extraction requests
///
/// Every `file` field is one part of the document, pages in field order.
/// An optional `binarize` field overrides the configured binarization.
async fn handle_extract(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, FlyerError> {
    let start = Instant::now();

    let mut files: Vec<(Bytes, String)> = Vec::new();
    let mut binarize: Option<bool> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| FlyerError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                let mime = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    FlyerError::InvalidRequest(format!("Failed to read file data: {}", e))
                })?;
                files.push((data, mime));
            }
            "binarize" => {
                let value = field.text().await.map_err(|e| {
                    FlyerError::InvalidRequest(format!("Invalid binarize value: {}", e))
                })?;
                binarize = Some(parse_flag(&value)?);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    if files.is_empty() {
        return Err(FlyerError::MissingFile);
    }

    let total: usize = files.iter().map(|(data, _)| data.len()).sum();
    if total > state.config.max_file_size {
        return Err(FlyerError::ImageTooLarge {
            size: total,
            max: state.config.max_file_size,
        });
    }

    let mut pages: Vec<RawPage> = Vec::new();
    for (data, mime) in &files {
        if !SUPPORTED_FORMATS.contains(&mime.as_str()) {
            tracing::warn!("Received file with content type: {}", mime);
        }
        pages.extend(loader::load_bytes(data)?);
    }

    let task_state = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut orchestrator = Orchestrator::new(
            &task_state.config,
            task_state.engine.as_ref(),
            &task_state.lexicon,
        );
        if let Some(enabled) = binarize {
            orchestrator = orchestrator.binarize(enabled);
        }
        orchestrator.process_document(pages)
    })
    .await
    .map_err(|e| FlyerError::Internal(format!("Extraction task failed: {}", e)))?;

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "Extraction completed in {}ms: {} products from {} pages",
        processing_time_ms,
        result.report.total_records,
        result.report.pages_attempted
    );

    Ok(Json(ExtractResponse {
        products: result.products,
        report: result.report,
        processing_time_ms,
    }))
}

fn parse_flag(value: &str) -> Result<bool, FlyerError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(FlyerError::InvalidRequest(format!(
            "Invalid binarize value: {}",
            other
        ))),
    }
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    let config = &state.config;
    let mut languages: Vec<String> = Vec::new();
    for profile in &config.acquisition.profiles {
        if !languages.contains(&profile.languages) {
            languages.push(profile.languages.clone());
        }
    }

    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: state.engine.name().to_string(),
        supported_formats: SUPPORTED_FORMATS.iter().map(|s| s.to_string()).collect(),
        languages,
        profiles: config.acquisition.profiles.iter().map(|p| p.label()).collect(),
        max_file_size_bytes: config.max_file_size,
        min_price: config.extraction.min_price.to_string(),
        max_price: config.extraction.max_price.to_string(),
        workers: config.workers,
    })
}

/// Handle category listing requests
async fn handle_categories(State(state): State<AppState>) -> impl IntoResponse {
    let categories: Vec<CategoryLabel> = state
        .lexicon
        .categories()
        .iter()
        .map(|c| c.label())
        .collect();
    Json(categories)
}
