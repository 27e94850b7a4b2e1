use std::{collections::HashMap, time::Instant};

use axum::{
    extract::{Query, Request, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use super::{error::ApiError, form::Fields, state::AppState};
use crate::{
    audio::{encode, AudioFormat},
    error::TtsError,
    extract::DocumentKind,
    synth::{render, SpeechSettings},
};

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Kokoro TTS API" }))
}

pub async fn voices(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "voices": state.engine.voices() }))
}

pub async fn languages(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "languages": state.engine.languages() }))
}

/// `POST /tts` with form fields.
pub async fn tts(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    let fields = Fields::from_request(request).await?;
    speak_text(state, fields).await
}

/// `GET /tts` with query parameters.
pub async fn tts_query(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    speak_text(state, params.into()).await
}

pub async fn upload_epub(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    speak_document(state, request, DocumentKind::Epub).await
}

pub async fn upload_pdf(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    speak_document(state, request, DocumentKind::Pdf).await
}

async fn speak_text(state: AppState, fields: Fields) -> Result<Response, ApiError> {
    let text = fields.required("text")?.to_string();
    let settings = fields.options()?.validate(state.engine.as_ref())?;
    synthesize(state, text, settings).await
}

async fn speak_document(state: AppState, request: Request, kind: DocumentKind) -> Result<Response, ApiError> {
    let mut fields = Fields::from_request(request).await?;
    let upload = fields.file.take().ok_or(TtsError::MissingField("file"))?;
    kind.check_file_name(&upload.file_name)?;
    let settings = fields.options()?.validate(state.engine.as_ref())?;

    info!(file = %upload.file_name, bytes = upload.bytes.len(), "extracting document text");
    let text = tokio::task::spawn_blocking(move || kind.extract(&upload.bytes))
        .await
        .map_err(|e| ApiError::internal(format!("extraction task failed: {e}")))??;
    synthesize(state, text, settings).await
}

/// Render and encode off the async runtime; chunks run sequentially.
async fn synthesize(state: AppState, text: String, settings: SpeechSettings) -> Result<Response, ApiError> {
    let format = settings.format;
    let engine = state.engine.clone();
    let chunk_size = state.chunk_size;
    let started = Instant::now();

    let (bytes, duration) = tokio::task::spawn_blocking(move || -> Result<_, TtsError> {
        let audio = render(engine.as_ref(), &text, &settings, chunk_size)?;
        let bytes = encode(&audio.samples, audio.sample_rate, settings.format)?;
        Ok((bytes, audio.duration_secs()))
    })
    .await
    .map_err(|e| ApiError::internal(format!("synthesis task failed: {e}")))??;

    info!(
        format = format.extension(),
        bytes = bytes.len(),
        audio_secs = duration,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "synthesized"
    );
    Ok(audio_response(bytes, format))
}

fn audio_response(bytes: Vec<u8>, format: AudioFormat) -> Response {
    (
        [
            (header::CONTENT_TYPE, format.mime().to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=output.{}", format.extension())),
        ],
        bytes,
    )
        .into_response()
}
