use std::io::Cursor;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use flyer_ocr::engine::{OcrProfile, PageSegMode, Rotation};
use flyer_ocr::engines::FixedTextEngine;
use flyer_ocr::server::{router, AppState};
use flyer_ocr::{Config, Lexicon, OcrEngine, OcrError, Orchestrator, PageStatus};

const BOUNDARY: &str = "flyer-test-boundary";

const FLYER_TEXT: &str = "عروض نهاية الأسبوع على كل المنتجات\n\
                          حليب المراعي 1 لتر\n\
                          25.99 جنيه\n\
                          زيت كريستال 700 مل\n\
                          65 جنيه";

fn test_config() -> Config {
    let mut config = Config::default();
    config.workers = 2;
    config.normalize.min_width = 48;
    config.normalize.min_height = 48;
    config
}

fn blank_page() -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(48, 48, Luma([255])))
}

fn png_bytes() -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    blank_page().write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Short snippets would otherwise fall under the page word gate.
fn run(text: &str) -> flyer_ocr::DocumentResult {
    let mut config = test_config();
    config.extraction.min_page_words = 1;
    let engine = FixedTextEngine::new(text);
    let lexicon = Lexicon::default();
    Orchestrator::new(&config, &engine, &lexicon).process_images(vec![blank_page()])
}

// ── Library pipeline ──────────────────────────────────────────────────────────

#[test]
fn test_name_and_price_pair() {
    let result = run("حليب المراعي\n25.99 جنيه");

    assert_eq!(result.products.len(), 1);
    let product = &result.products[0];
    assert!(product.name.contains("حليب المراعي"));
    assert_eq!(product.price, dec("25.99"));
    assert_eq!(product.discount_percent, None);
    assert_eq!(product.category.id, "dairy");
    assert_eq!(product.page, Some(1));
}

#[test]
fn test_date_number_is_not_a_price() {
    let result = run("عرض خاص\nديسمبر 2024\n150");

    assert!(result.products.is_empty());
    assert_eq!(result.report.pages[0].status, PageStatus::Empty);
}

#[test]
fn test_discount_derives_original_price() {
    let result = run("شيبسي توست\n20% خصم\n8.50 EGP");

    assert_eq!(result.products.len(), 1);
    let product = &result.products[0];
    assert_eq!(product.price, dec("8.50"));
    assert_eq!(product.discount_percent, Some(dec("20")));
    assert_eq!(product.original_price, Some(dec("10.63")));
}

#[test]
fn test_one_name_serves_two_prices() {
    let result = run("45 جنيه\nجبنة رومي\n50 جنيه");

    let names: Vec<&str> = result.products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["جبنة رومي", "جبنة رومي"]);
}

#[test]
fn test_longest_recognition_is_selected() {
    let config = test_config();
    let lexicon = Lexicon::default();
    let engine = FixedTextEngine::failing()
        .with_text(PageSegMode::UniformBlock, "x".repeat(40))
        .with_text(PageSegMode::SparseText, format!("{:<120}", FLYER_TEXT))
        .with_text(PageSegMode::Auto, "y".repeat(85));

    let result = Orchestrator::new(&config, &engine, &lexicon).process_images(vec![blank_page()]);

    let page = &result.report.pages[0];
    assert_eq!(page.profile.as_deref(), Some("oem1/psm11/ara+eng"));
    assert_eq!(page.status, PageStatus::Ok);
    assert_eq!(result.products.len(), 2);
}

#[test]
fn test_no_prices_means_no_records() {
    let result = run("أفضل الأسعار\nتسوق الآن واستمتع");
    assert!(result.products.is_empty());
    assert_eq!(result.report.total_records, 0);
}

/// Panics on its first recognition call, then behaves.
struct PanicOnceEngine {
    calls: AtomicUsize,
}

impl OcrEngine for PanicOnceEngine {
    fn name(&self) -> &'static str {
        "panic-once"
    }

    fn recognize(&self, _image: &DynamicImage, _profile: &OcrProfile) -> Result<String, OcrError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("recognizer crashed");
        }
        Ok(FLYER_TEXT.to_string())
    }

    fn detect_orientation(&self, _image: &DynamicImage) -> Result<Rotation, OcrError> {
        Ok(Rotation::None)
    }
}

#[test]
fn test_panicking_page_is_isolated_without_workers() {
    let mut config = test_config();
    config.workers = 1;
    let lexicon = Lexicon::default();
    let engine = PanicOnceEngine {
        calls: AtomicUsize::new(0),
    };

    let result = Orchestrator::new(&config, &engine, &lexicon)
        .process_images(vec![blank_page(), blank_page()]);

    assert_eq!(result.report.pages_attempted, 2);
    assert_eq!(result.report.pages[0].status, PageStatus::Failed);
    assert_eq!(result.report.pages[1].status, PageStatus::Ok);
    assert_eq!(result.report.pages_with_records, 1);
    assert!(result.products.iter().all(|p| p.page == Some(2)));
}

#[test]
fn test_panicking_single_page_document() {
    let config = test_config();
    let lexicon = Lexicon::default();
    let engine = PanicOnceEngine {
        calls: AtomicUsize::new(0),
    };

    let result = Orchestrator::new(&config, &engine, &lexicon).process_images(vec![blank_page()]);

    assert_eq!(result.report.pages[0].status, PageStatus::Failed);
    assert!(result.products.is_empty());
}

// ── HTTP surface ─────────────────────────────────────────────────────────────

fn app(engine: FixedTextEngine) -> axum::Router {
    let engine: Arc<dyn OcrEngine> = Arc::new(engine);
    router(AppState::new(test_config(), engine))
}

enum Part<'a> {
    File(&'a str, &'a [u8]),
    Text(&'a str, &'a str),
}

fn multipart(parts: &[Part]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File(mime, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"page\"\r\n\
                         Content-Type: {}\r\n\r\n",
                        mime
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/extract")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = send(app(FixedTextEngine::new("")), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_info_endpoint() {
    let (status, body) = send(app(FixedTextEngine::new("")), get("/info")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["engine"], "fixed");
    assert_eq!(body["profiles"].as_array().unwrap().len(), 3);
    assert_eq!(body["languages"], serde_json::json!(["ara+eng"]));
    assert_eq!(body["min_price"], "5");
    assert!(body["supported_formats"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f == "application/pdf"));
}

#[tokio::test]
async fn test_categories_endpoint() {
    let (status, body) = send(app(FixedTextEngine::new("")), get("/categories")).await;

    assert_eq!(status, StatusCode::OK);
    let categories = body.as_array().unwrap();
    assert_eq!(categories.first().unwrap()["id"], "dairy");
    assert_eq!(categories.last().unwrap()["id"], "other");
    assert_eq!(categories.last().unwrap()["en"], "Other Products");
}

#[tokio::test]
async fn test_extract_single_image() {
    let png = png_bytes();
    let request = multipart(&[Part::File("image/png", &png)]);

    let (status, body) = send(app(FixedTextEngine::new(FLYER_TEXT)), request).await;

    assert_eq!(status, StatusCode::OK);
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["price"], "25.99");
    assert_eq!(products[0]["category"]["id"], "dairy");
    assert_eq!(products[1]["price"], "65");
    assert_eq!(body["report"]["pages_attempted"], 1);
    assert_eq!(body["report"]["pages"][0]["status"], "ok");
}

#[tokio::test]
async fn test_extract_multiple_files_keeps_page_order() {
    let png = png_bytes();
    let request = multipart(&[
        Part::File("image/png", &png),
        Part::File("image/png", &png),
        Part::Text("binarize", "false"),
    ]);

    let (status, body) = send(app(FixedTextEngine::new(FLYER_TEXT)), request).await;

    assert_eq!(status, StatusCode::OK);
    let pages: Vec<u64> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["page"].as_u64().unwrap())
        .collect();
    assert_eq!(pages, vec![1, 1, 2, 2]);

    let stages = body["report"]["pages"][0]["stages"].as_array().unwrap();
    assert!(stages.iter().all(|s| s["name"] != "binarize"));
}

#[tokio::test]
async fn test_extract_corrupt_image_reports_failed_page() {
    let request = multipart(&[Part::File("image/png", b"not a png at all")]);

    let (status, body) = send(app(FixedTextEngine::new(FLYER_TEXT)), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["products"].as_array().unwrap().len(), 0);
    assert_eq!(body["report"]["pages"][0]["status"], "failed");
}

#[tokio::test]
async fn test_extract_unreadable_pdf_is_rejected() {
    let request = multipart(&[Part::File("application/pdf", b"%PDF-1.4 broken")]);

    let (status, body) = send(app(FixedTextEngine::new(FLYER_TEXT)), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "PDF_ERROR");
}

#[tokio::test]
async fn test_extract_without_file() {
    let request = multipart(&[Part::Text("binarize", "true")]);

    let (status, body) = send(app(FixedTextEngine::new(FLYER_TEXT)), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FILE");
}

#[tokio::test]
async fn test_extract_bad_binarize_flag() {
    let png = png_bytes();
    let request = multipart(&[Part::File("image/png", &png), Part::Text("binarize", "sometimes")]);

    let (status, body) = send(app(FixedTextEngine::new(FLYER_TEXT)), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
}
