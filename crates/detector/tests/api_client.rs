//! Integration tests for `DetectorApi` against an in-process stub of the
//! detection service.
//!
//! The stub records every multipart upload it receives and answers with
//! canned JSON so the tests can check both the request shape and the
//! reply decoding.

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use oceaneye_core::detection::ClassCount;
use oceaneye_core::media::{MediaBlob, CLIP_MIME};
use oceaneye_detector::api::{DetectorApi, DetectorApiError, DetectorEndpoints};
use serde_json::{json, Value};
use url::Url;

#[derive(Debug, Clone)]
struct Upload {
    field: String,
    file_name: String,
    content_type: String,
    size: usize,
}

type Seen = Arc<Mutex<Vec<Upload>>>;

async fn record(seen: &Seen, mut multipart: Multipart) {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap();
        seen.lock().unwrap().push(Upload {
            field: name,
            file_name,
            content_type,
            size: bytes.len(),
        });
    }
}

async fn clip_ok(State(seen): State<Seen>, multipart: Multipart) -> Json<Value> {
    record(&seen, multipart).await;
    Json(json!({
        "code": 1,
        "msg": "ok",
        "result": {
            "video_play_url": "/output_video/abc_output.mp4",
            "video_local_path": "output_video/abc_output.mp4",
            "video_width": 640,
            "video_height": 1138,
            "detections": [{"class_id": 3, "count": 2, "is_toxic": true}]
        }
    }))
}

async fn frame_ok(State(seen): State<Seen>, multipart: Multipart) -> Json<Value> {
    record(&seen, multipart).await;
    Json(json!({
        "code": 1,
        "result": {"detections": [{"class_id": 5, "count": 1, "is_toxic": false}]}
    }))
}

async fn clip_rejected(State(seen): State<Seen>, multipart: Multipart) -> Json<Value> {
    record(&seen, multipart).await;
    Json(json!({"code": 0, "msg": "bad video", "result": {}}))
}

async fn server_error() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn not_json() -> &'static str {
    "<html>gateway</html>"
}

/// Serve `router` on an ephemeral port and return its origin.
async fn spawn(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

fn api(origin: Url) -> DetectorApi {
    DetectorApi::new(DetectorEndpoints::with_default_paths(origin).unwrap())
}

fn clip() -> MediaBlob {
    MediaBlob::new(vec![0u8; 2048], CLIP_MIME, "dive-record-1.mp4")
}

// ---------------------------------------------------------------------------
// Test: clip upload uses the video_file field and decodes the reply
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clip_upload_sends_video_file_part() {
    let seen = Seen::default();
    let router = Router::new()
        .route("/DETECT_FISH_VIDEO", post(clip_ok))
        .with_state(seen.clone());
    let api = api(spawn(router).await);

    let response = api.detect_clip(&clip()).await.unwrap();

    assert_eq!(
        response.counts,
        vec![ClassCount { class_id: 3, count: 2, is_toxic: true }]
    );
    assert_eq!(response.sighting_count(), 2);
    let reference = response.result.expect("clip replies carry a result");
    assert_eq!(reference.play_url, "/output_video/abc_output.mp4");

    let uploads = seen.lock().unwrap().clone();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].field, "video_file");
    assert_eq!(uploads[0].file_name, "dive-record-1.mp4");
    assert_eq!(uploads[0].content_type, "video/mp4");
    assert_eq!(uploads[0].size, 2048);
}

// ---------------------------------------------------------------------------
// Test: frame upload uses the image_file field
// ---------------------------------------------------------------------------

#[tokio::test]
async fn frame_upload_sends_image_file_part() {
    let seen = Seen::default();
    let router = Router::new()
        .route("/DETECT_FISH_IMAGE", post(frame_ok))
        .with_state(seen.clone());
    let api = api(spawn(router).await);

    let response = api
        .detect_frame(&MediaBlob::jpeg_frame(vec![0xFFu8, 0xD8, 0xFF]))
        .await
        .unwrap();

    assert_eq!(response.counts.len(), 1);
    assert!(response.result.is_none());

    let uploads = seen.lock().unwrap().clone();
    assert_eq!(uploads[0].field, "image_file");
    assert_eq!(uploads[0].file_name, "frame.jpg");
    assert_eq!(uploads[0].content_type, "image/jpeg");
}

// ---------------------------------------------------------------------------
// Test: failure envelopes surface the service message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failure_code_maps_to_service_error() {
    let seen = Seen::default();
    let router = Router::new()
        .route("/DETECT_FISH_VIDEO", post(clip_rejected))
        .with_state(seen);
    let api = api(spawn(router).await);

    let err = api.detect_clip(&clip()).await.unwrap_err();

    assert_matches!(err, DetectorApiError::Service(ref msg) if msg == "bad video");
}

// ---------------------------------------------------------------------------
// Test: HTTP status errors and junk bodies
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_success_status_maps_to_api_error() {
    let router = Router::new().route("/DETECT_FISH_VIDEO", post(server_error));
    let api = api(spawn(router).await);

    let err = api.detect_clip(&clip()).await.unwrap_err();

    assert_matches!(err, DetectorApiError::ApiError { status: 500, ref body } if body == "boom");
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let router = Router::new().route("/DETECT_FISH_IMAGE", post(not_json));
    let api = api(spawn(router).await);

    let err = api
        .detect_frame(&MediaBlob::jpeg_frame(vec![1u8]))
        .await
        .unwrap_err();

    assert_matches!(err, DetectorApiError::Malformed(_));
}

#[tokio::test]
async fn unreachable_service_is_a_request_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let api = api(Url::parse(&format!("http://{addr}")).unwrap());

    let err = api.detect_clip(&clip()).await.unwrap_err();

    assert_matches!(err, DetectorApiError::Request(_));
}
