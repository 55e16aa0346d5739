#![cfg(feature = "web")]

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use serde_json::Value;
use tower::ServiceExt;

use imagesim::{
    create_router, error::DECODE_FAILURE_MESSAGE, AppError, AppState, Config, FeatureExtractor,
    Result,
};

const BOUNDARY: &str = "imagesim-test-boundary";

/// Hands out queued embeddings in order, then repeats the last one
struct Scripted(Mutex<Vec<Vec<f32>>>);

impl Scripted {
    fn new(mut embeddings: Vec<Vec<f32>>) -> Arc<Self> {
        embeddings.reverse();
        Arc::new(Self(Mutex::new(embeddings)))
    }
}

impl FeatureExtractor for Scripted {
    fn extract(&self, _image: &DynamicImage) -> Result<Vec<f32>> {
        let mut queue = self.0.lock().unwrap();
        match queue.len() {
            0 => Err(AppError::Internal("no embeddings queued".to_string())),
            1 => Ok(queue[0].clone()),
            _ => Ok(queue.pop().unwrap()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn app_with(config: Config, extractor: Arc<dyn FeatureExtractor>) -> Router {
    create_router(AppState::new(config, extractor))
}

fn app(embeddings: Vec<Vec<f32>>) -> Router {
    app_with(Config::default(), Scripted::new(embeddings))
}

fn jpeg(color: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, image::Rgb(color)));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageOutputFormat::Jpeg(90)).unwrap();
    buf.into_inner()
}

/// (field name, filename, content type, bytes)
type Part<'a> = (&'a str, &'a str, &'a str, Vec<u8>);

fn compare_request(parts: Vec<Part<'_>>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, file_name, content_type, bytes) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(&bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/compare/images")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_compare_images_success() {
    let app = app(vec![vec![1.0, 0.0], vec![1.0, 1.0]]);

    let response = app
        .oneshot(compare_request(vec![
            ("image1", "test1.jpg", "image/jpeg", jpeg([255, 0, 0])),
            ("image2", "test2.jpg", "image/jpeg", jpeg([0, 0, 255])),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    // 1/sqrt(2) rounded to four decimals
    assert_eq!(json["similarity_score"].as_f64(), Some(0.7071));
    assert_eq!(json.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_compare_identical_embeddings() {
    let app = app(vec![vec![0.3, -1.2, 4.0]]);

    let response = app
        .oneshot(compare_request(vec![
            ("image1", "a.jpg", "image/jpeg", jpeg([10, 20, 30])),
            ("image2", "b.jpg", "image/jpeg", jpeg([10, 20, 30])),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["similarity_score"].as_f64(), Some(1.0));
}

#[tokio::test]
async fn test_compare_images_invalid_files() {
    let app = app(vec![vec![1.0]]);

    let response = app
        .oneshot(compare_request(vec![
            ("image1", "test1.txt", "text/plain", b"not an image".to_vec()),
            ("image2", "test2.txt", "text/plain", b"also not an image".to_vec()),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["detail"], DECODE_FAILURE_MESSAGE);
}

#[tokio::test]
async fn test_second_file_invalid() {
    let app = app(vec![vec![1.0]]);

    let response = app
        .oneshot(compare_request(vec![
            ("image1", "ok.jpg", "image/jpeg", jpeg([0, 255, 0])),
            ("image2", "broken.jpg", "image/jpeg", b"\xFF\xD8 truncated".to_vec()),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["detail"], DECODE_FAILURE_MESSAGE);
}

#[tokio::test]
async fn test_fake_heic_is_a_decode_error() {
    let app = app(vec![vec![1.0]]);

    let response = app
        .oneshot(compare_request(vec![
            ("image1", "test.heic", "image/heic", b"fake_heic_data".to_vec()),
            ("image2", "ok.jpg", "image/jpeg", jpeg([0, 255, 0])),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["detail"], DECODE_FAILURE_MESSAGE);
}

#[tokio::test]
async fn test_missing_field() {
    let app = app(vec![vec![1.0]]);

    let response = app
        .oneshot(compare_request(vec![(
            "image1",
            "test1.jpg",
            "image/jpeg",
            jpeg([255, 0, 0]),
        )]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["detail"], "Field required: image2");
}

#[tokio::test]
async fn test_unknown_fields_are_ignored() {
    let app = app(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);

    let response = app
        .oneshot(compare_request(vec![
            ("comment", "note.txt", "text/plain", b"hello".to_vec()),
            ("image1", "test1.jpg", "image/jpeg", jpeg([255, 0, 0])),
            ("image2", "test2.jpg", "image/jpeg", jpeg([0, 0, 255])),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["similarity_score"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_body_limit() {
    let config = Config {
        max_upload_bytes: 1024,
        ..Config::default()
    };
    let app = app_with(config, Scripted::new(vec![vec![1.0]]));

    let response = app
        .oneshot(compare_request(vec![
            ("image1", "big1.bin", "image/jpeg", vec![0u8; 4096]),
            ("image2", "big2.bin", "image/jpeg", vec![0u8; 4096]),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = json_body(response).await;
    assert!(json["detail"]
        .as_str()
        .is_some_and(|detail| detail.starts_with("Payload too large")));
}

#[tokio::test]
async fn test_non_multipart_body_gets_json_error() {
    let app = app(vec![vec![1.0]]);
    let request = Request::builder()
        .method("POST")
        .uri("/api/compare/images")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"image1": "cat.jpg"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let json = json_body(response).await;
    assert!(json["detail"]
        .as_str()
        .is_some_and(|detail| detail.starts_with("Upload error")));
}

#[tokio::test]
async fn test_missing_content_type_gets_json_error() {
    let app = app(vec![vec![1.0]]);
    let request = Request::builder()
        .method("POST")
        .uri("/api/compare/images")
        .body(Body::from("image1=cat.jpg"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["detail"].is_string());
}

#[test]
fn test_health_check() {
    let app = app(vec![vec![1.0]]);
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();

    let response = tokio_test::block_on(app.oneshot(request)).unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let json = tokio_test::block_on(json_body(response));
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model"], "scripted");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = app(vec![vec![1.0]]);
    let request = Request::builder()
        .uri("/api/health")
        .header("x-request-id", "client-chosen-id")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "client-chosen-id");
}

#[tokio::test]
async fn test_unknown_route_without_static_dir() {
    let app = app(vec![vec![1.0]]);
    let request = Request::builder()
        .uri("/index.html")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_static_front_end() {
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    let site = assert_fs::TempDir::new().unwrap();
    site.child("index.html")
        .write_str("<h1>imagesim front-end</h1>")
        .unwrap();
    site.child("js/app.js").write_str("// app").unwrap();
    site.child("index.html").assert(predicate::path::exists());

    let config = Config {
        static_dir: Some(site.path().to_path_buf()),
        ..Config::default()
    };
    let app = app_with(config, Scripted::new(vec![vec![1.0]]));

    let pages = [
        ("/", "imagesim front-end"),
        ("/js/app.js", "// app"),
        ("/some/page", "imagesim front-end"),
    ];
    for (uri, marker) in pages {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains(marker), "GET {}", uri);
    }
}
