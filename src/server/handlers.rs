use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{info, warn};

use super::error::ServerError;
use super::form::PortalForm;
use super::models::{
    LangDetectRequest, LangDetectResponse, SpeechRequest, TranscriptionResponse,
    TranslateRequest, TranslateResponse,
};
use super::state::ServerState;
use crate::extraction::{self, Pdftotext, TEXT_MIME, WAV_MIME};
use crate::history::TranslationLog;
use crate::languages;
use crate::pipeline::{
    Coordinator, PipelineRequest, PipelineResult, SynthesizedAudio, TaskInput, TaskKind,
    with_timeout,
};
use crate::providers::HuggingFace;
use crate::settings::Settings;

pub async fn run_server(settings: Settings) -> Result<()> {
    if settings.token.is_none() {
        warn!("server: HF_TOKEN is not set, inference calls are unauthenticated");
    }
    let settings = Arc::new(settings);
    let gateway =
        HuggingFace::new(settings.token.clone()).with_base_url(settings.base_url.clone());
    let log = match settings.db_path.as_ref() {
        Some(path) => TranslationLog::lazy(path.clone()),
        None => TranslationLog::disabled(),
    };
    let coordinator = Coordinator::new(
        Arc::new(gateway),
        Arc::new(Pdftotext::default()),
        log,
        settings.clone(),
    );

    let app = router(coordinator);
    let listener = tokio::net::TcpListener::bind(&settings.addr)
        .await
        .with_context(|| format!("failed to bind server address {}", settings.addr))?;
    info!("server: listening on {}", settings.addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(coordinator: Coordinator) -> Router {
    let body_limit = coordinator.settings().max_upload_bytes;
    let state = Arc::new(ServerState { coordinator });
    Router::new()
        .route("/health", get(health))
        .route("/api/translate", post(translate))
        .route("/api/pdf/translate", post(pdf_translate))
        .route("/api/speech-to-text", post(speech_to_text))
        .route("/api/speech_to_text", post(speech_to_text))
        .route("/api/text-to-speech", post(text_to_speech))
        .route("/api/text_to_speech", post(text_to_speech))
        .route("/api/unified-translate", post(unified_translate))
        .route("/api/lang-detect", post(lang_detect))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
    headers.insert(
        "access-control-expose-headers",
        HeaderValue::from_static(
            "content-disposition,x-translation-model,x-tts-model,x-source-language,x-target-language,x-latency",
        ),
    );
}

async fn translate(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, ServerError> {
    let Json(payload) = payload.map_err(|err| ServerError::bad_request(err.body_text()))?;
    let models = payload.candidates();
    let mut request = PipelineRequest::new(TaskInput::Text(payload.text.unwrap_or_default()));
    request.source_lang = payload.source;
    request.target_lang = payload.target;
    request.models = models;
    request.reject_over_limit = true;

    let result = state
        .coordinator
        .run(request, state.settings().timeouts.text)
        .await?;
    Ok(Json(translate_response(result, None)))
}

async fn pdf_translate(
    State(state): State<Arc<ServerState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    let form = read_form(multipart).await?;
    let pdf = form
        .pdf
        .ok_or_else(|| ServerError::bad_request("PDF file is required"))?;
    let mut request = PipelineRequest::new(TaskInput::Pdf(pdf.bytes));
    request.source_lang = form.source_lang;
    request.target_lang = form.target_lang;
    request.models = form.model_ids;

    let result = state
        .coordinator
        .run(request, state.settings().timeouts.pdf)
        .await?;
    text_attachment(result)
}

async fn speech_to_text(
    State(state): State<Arc<ServerState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscriptionResponse>, ServerError> {
    let form = read_form(multipart).await?;
    let audio = form
        .audio
        .ok_or_else(|| ServerError::bad_request("audio file missing"))?;
    let content_type = extraction::audio_content_type(audio.content_type.as_deref(), &audio.bytes);

    let transcript = with_timeout(
        state.settings().timeouts.speech,
        state
            .coordinator
            .speech_to_text(&audio.bytes, &content_type, &form.model_ids),
    )
    .await?;
    info!(
        "server: transcribed {} chars with {}",
        transcript.result.chars().count(),
        transcript.model_used
    );
    Ok(Json(TranscriptionResponse {
        text: transcript.result.trim().to_string(),
        model_used: transcript.model_used,
    }))
}

async fn text_to_speech(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<Response, ServerError> {
    let Json(payload) = payload.map_err(|err| ServerError::bad_request(err.body_text()))?;
    let models = payload.candidates();
    let text = payload.text.unwrap_or_default();

    let speech = with_timeout(
        state.settings().timeouts.speech,
        state.coordinator.text_to_speech(&text, &models),
    )
    .await?;
    let mime = audio_mime(&speech.result);
    with_headers(
        speech.result,
        vec![("content-type", mime), ("x-tts-model", speech.model_used)],
    )
}

async fn unified_translate(
    State(state): State<Arc<ServerState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    let PortalForm {
        content_type,
        text,
        source_lang,
        target_lang,
        model_ids,
        return_audio,
        audio,
        pdf,
    } = read_form(multipart).await?;

    let raw_kind = content_type.unwrap_or_else(|| TaskKind::Text.as_str().to_string());
    let kind = TaskKind::parse(&raw_kind).ok_or_else(|| {
        ServerError::bad_request(format!(
            "contentType must be text, pdf or voice (got {})",
            raw_kind
        ))
    })?;

    let input = match kind {
        TaskKind::Text => TaskInput::Text(text.unwrap_or_default()),
        TaskKind::Pdf => {
            let pdf = pdf.ok_or_else(|| ServerError::bad_request("PDF file is required"))?;
            TaskInput::Pdf(pdf.bytes)
        }
        TaskKind::Voice => {
            let audio =
                audio.ok_or_else(|| ServerError::bad_request("Audio file is required"))?;
            TaskInput::Voice {
                content_type: extraction::audio_content_type(
                    audio.content_type.as_deref(),
                    &audio.bytes,
                ),
                audio: audio.bytes,
                return_audio,
            }
        }
    };
    let mut request = PipelineRequest::new(input);
    request.source_lang = source_lang;
    request.target_lang = target_lang;
    request.models = model_ids;

    let mut result = state
        .coordinator
        .run(request, state.settings().timeouts.unified)
        .await?;
    match result.kind {
        TaskKind::Pdf => text_attachment(result),
        TaskKind::Voice => match result.audio.take() {
            Some(audio) => audio_reply(result, audio),
            None => Ok(Json(translate_response(result, Some(TaskKind::Voice))).into_response()),
        },
        TaskKind::Text => Ok(Json(translate_response(result, Some(TaskKind::Text))).into_response()),
    }
}

async fn lang_detect(
    payload: Result<Json<LangDetectRequest>, JsonRejection>,
) -> Result<Json<LangDetectResponse>, ServerError> {
    let Json(payload) = payload.map_err(|err| ServerError::bad_request(err.body_text()))?;
    let text = payload.text.unwrap_or_default();
    let raw = languages::detect_iso1(&text);
    let iso1 = languages::normalize(raw, "en");
    Ok(Json(LangDetectResponse {
        iso1: iso1.to_string(),
        raw: raw.map(str::to_string),
    }))
}

async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<PortalForm, ServerError> {
    let multipart = multipart.map_err(|err| ServerError::bad_request(err.body_text()))?;
    PortalForm::read(multipart).await
}

fn translate_response(result: PipelineResult, kind: Option<TaskKind>) -> TranslateResponse {
    TranslateResponse {
        translated_text: result.content,
        source_language: result.source_lang,
        target_language: result.target_lang,
        model_used: result.model_used,
        content_type: kind.map(|kind| kind.as_str().to_string()),
        latency: result.latency_ms,
        success: true,
    }
}

fn text_attachment(result: PipelineResult) -> Result<Response, ServerError> {
    let disposition = format!(
        "attachment; filename=\"translated_{}.txt\"",
        result.target_lang
    );
    with_headers(
        result.content,
        vec![
            ("content-type", format!("{}; charset=utf-8", TEXT_MIME)),
            ("content-disposition", disposition),
            ("x-translation-model", result.model_used),
            ("x-source-language", result.source_lang),
            ("x-target-language", result.target_lang),
        ],
    )
}

fn audio_reply(result: PipelineResult, audio: SynthesizedAudio) -> Result<Response, ServerError> {
    let mime = audio_mime(&audio.bytes);
    with_headers(
        audio.bytes,
        vec![
            ("content-type", mime),
            ("x-source-language", result.source_lang),
            ("x-target-language", result.target_lang),
            ("x-translation-model", result.model_used),
            ("x-tts-model", audio.model_used),
            ("x-latency", result.latency_ms.to_string()),
        ],
    )
}

fn audio_mime(bytes: &[u8]) -> String {
    infer::get(bytes)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Audio)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| WAV_MIME.to_string())
}

fn with_headers(
    body: impl IntoResponse,
    headers: Vec<(&'static str, String)>,
) -> Result<Response, ServerError> {
    let mut response = body.into_response();
    for (name, value) in headers {
        let value = HeaderValue::from_str(&value)
            .map_err(|_| ServerError::internal(format!("invalid value for header {}", name)))?;
        response
            .headers_mut()
            .insert(HeaderName::from_static(name), value);
    }
    Ok(response)
}
