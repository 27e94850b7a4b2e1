mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use common::ScriptedEngine;
use kokorotts::server::{router, AppState};

const BOUNDARY: &str = "kokorotts-test-boundary";

fn app() -> Router {
    router(AppState::new(Arc::new(ScriptedEngine::new(200))))
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_post(uri: &str, file_name: &str, file: &[u8], fields: &[(&str, &str)]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_root_message() {
    let (status, json) = send_json(app(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Kokoro TTS API");
}

#[tokio::test]
async fn test_voices_and_languages() {
    let (status, json) = send_json(app(), get("/voices")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["voices"], serde_json::json!(["af_bella", "af_sarah", "am_adam"]));

    let (status, json) = send_json(app(), get("/languages")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["languages"], serde_json::json!(["en-gb", "en-us"]));
}

#[tokio::test]
async fn test_get_tts_returns_wav_attachment() {
    let (status, headers, body) = send(app(), get("/tts?text=Hello%20world.%20This%20is%20a%20test.")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment; filename=output.wav");
    assert_eq!(&body[..4], b"RIFF");
    assert_eq!(&body[8..12], b"WAVE");
}

#[tokio::test]
async fn test_post_tts_form() {
    let (status, headers, body) = send(app(), form_post("/tts", "text=Hello+there.&voice=am_adam&speed=1.2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "audio/wav");
    assert!(body.len() > 44);
}

#[tokio::test]
async fn test_post_tts_multipart_fields() {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\nHi there.\r\n--{BOUNDARY}--\r\n")
            .as_bytes(),
    );
    let request = Request::post("/tts")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();
    let (status, _, _) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_mp3_output() {
    let (status, headers, body) = send(app(), form_post("/tts", "text=Hello+world.&format=mp3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "audio/mp3");
    assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment; filename=output.mp3");
    assert!(!body.is_empty());
}

#[tokio::test]
async fn test_blended_voice() {
    let (status, _, _) = send(app(), form_post("/tts", "text=Mixed.&voice=af_sarah%3A30%2Cam_adam%3A70")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_long_text_is_split_and_retried() {
    let app = router(AppState::new(Arc::new(ScriptedEngine::new(40))).with_chunk_size(400));
    let text = "word ".repeat(60);
    let (status, headers, body) = send(app, form_post("/tts", &format!("text={}", text.replace(' ', "+")))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "audio/wav");
    assert!(body.len() > 44);
}

#[tokio::test]
async fn test_unsupported_format() {
    let (status, json) = send_json(app(), form_post("/tts", "text=Hi.&format=ogg")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "Format must be 'wav' or 'mp3'");
}

#[tokio::test]
async fn test_unsupported_language() {
    let (status, json) = send_json(app(), form_post("/tts", "text=Hi.&lang=xx")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "Unsupported language: xx. Supported: en-gb, en-us");
}

#[tokio::test]
async fn test_unknown_voice() {
    let (status, json) = send_json(app(), form_post("/tts", "text=Hi.&voice=nobody")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].as_str().unwrap().contains("nobody"));
}

#[tokio::test]
async fn test_three_voice_blend_rejected() {
    let (status, _) = send_json(app(), form_post("/tts", "text=Hi.&voice=af_sarah%2Cam_adam%2Caf_bella")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_speed_out_of_range() {
    let (status, _) = send_json(app(), form_post("/tts", "text=Hi.&speed=3.5")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_text() {
    let (status, json) = send_json(app(), form_post("/tts", "voice=af_sarah")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].as_str().unwrap().contains("text"));
}

#[tokio::test]
async fn test_blank_text_yields_no_audio() {
    let (status, json) = send_json(app(), form_post("/tts", "text=+++")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["detail"], "No audio generated");
}

#[tokio::test]
async fn test_epub_upload_requires_epub_extension() {
    let request = multipart_post("/upload-epub", "book.txt", b"plain text", &[]);
    let (status, json) = send_json(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "File must be an EPUB");
}

#[tokio::test]
async fn test_epub_upload_returns_audio() {
    let book = common::epub_book(&["It was a dark night.", "The end came quickly."]);
    let request = multipart_post("/upload-epub", "story.epub", &book, &[("voice", "af_bella")]);
    let (status, headers, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment; filename=output.wav");
    assert_eq!(&body[..4], b"RIFF");
}

#[tokio::test]
async fn test_pdf_upload_requires_pdf_extension() {
    let request = multipart_post("/upload-pdf", "paper.docx", b"not a pdf", &[("voice", "af_sarah")]);
    let (status, json) = send_json(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "File must be a PDF");
}

#[tokio::test]
async fn test_upload_without_file() {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"voice\"\r\n\r\naf_sarah\r\n--{BOUNDARY}--\r\n")
            .as_bytes(),
    );
    let request = Request::post("/upload-pdf")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send_json(app(), request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_corrupt_pdf_is_server_error() {
    let request = multipart_post("/upload-pdf", "paper.pdf", b"definitely not a pdf", &[]);
    let (status, _) = send_json(app(), request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
