//! HTTP surface: `POST /api/process` and `GET /health`.

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::error::ExtractError;
use crate::extract::{allowed_file, extract_text_from_upload, normalize_input};
use crate::pipeline::{ProcessResponse, TriageProcessor};

const INVALID_FORMAT: &str = "Formato inválido. Use .txt ou .pdf";
const EMPTY_INPUT: &str = "Envie um texto ou um arquivo para processar.";
const UNREADABLE_FILE: &str = "Não foi possível ler o arquivo enviado.";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<TriageProcessor>,
}

/// Build the Axum router for the triage API.
pub fn triage_routes(processor: Arc<TriageProcessor>, max_upload_bytes: usize) -> Router {
    let state = AppState { processor };

    Router::new()
        .route("/health", get(health))
        .route("/api/process", post(process))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ── Process ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ProcessRequest {
    #[serde(default)]
    text: String,
}

/// What the caller sent, before extraction.
#[derive(Debug, Default)]
struct Submission {
    text: String,
    file: Option<(String, Vec<u8>)>,
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

fn content_type_is(request: &Request, mime: &str) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(mime))
}

async fn read_multipart(mut multipart: Multipart) -> Result<Submission, Response> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "Malformed multipart body");
        bad_request(EMPTY_INPUT)
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => {
                submission.text = field.text().await.map_err(|e| {
                    warn!(error = %e, "Failed to read text field");
                    bad_request(EMPTY_INPUT)
                })?;
            }
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    warn!(error = %e, "Failed to read file field");
                    bad_request(UNREADABLE_FILE)
                })?;
                // Browsers send an empty part when no file was chosen.
                if !filename.is_empty() {
                    submission.file = Some((filename, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }

    Ok(submission)
}

async fn read_submission(request: Request) -> Result<Submission, Response> {
    if content_type_is(&request, "multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(IntoResponse::into_response)?;
        return read_multipart(multipart).await;
    }

    if content_type_is(&request, "application/x-www-form-urlencoded") {
        let Form(body) = Form::<ProcessRequest>::from_request(request, &())
            .await
            .map_err(|e| {
                debug!(error = %e, "Rejected form body");
                bad_request(EMPTY_INPUT)
            })?;
        return Ok(Submission {
            text: body.text,
            file: None,
        });
    }

    let Json(body) = Json::<ProcessRequest>::from_request(request, &())
        .await
        .map_err(|e| {
            debug!(error = %e, "Rejected JSON body");
            bad_request(EMPTY_INPUT)
        })?;
    Ok(Submission {
        text: body.text,
        file: None,
    })
}

async fn extract_upload(filename: String, bytes: Vec<u8>) -> Result<String, ExtractError> {
    // pdf-extract is CPU-bound and may panic on malformed input.
    tokio::task::spawn_blocking(move || extract_text_from_upload(&filename, &bytes))
        .await
        .map_err(|e| ExtractError::Pdf(format!("extraction task failed: {e}")))?
}

async fn process(State(state): State<AppState>, request: Request) -> Response {
    let submission = match read_submission(request).await {
        Ok(submission) => submission,
        Err(response) => return response,
    };

    let mut text = submission.text;

    if let Some((filename, bytes)) = submission.file {
        if !allowed_file(&filename) {
            return bad_request(INVALID_FORMAT);
        }
        match extract_upload(filename.clone(), bytes).await {
            Ok(extracted) if !extracted.trim().is_empty() => text = extracted,
            Ok(_) => debug!(%filename, "Upload yielded no text"),
            Err(ExtractError::UnsupportedFormat(_)) => return bad_request(INVALID_FORMAT),
            Err(e) => {
                warn!(%filename, error = %e, "Failed to extract upload");
                return bad_request(UNREADABLE_FILE);
            }
        }
    }

    let text = normalize_input(&text);
    if text.is_empty() {
        return bad_request(EMPTY_INPUT);
    }

    let result = state.processor.classify(&text).await;
    info!(
        category = %result.category,
        text_len = text.chars().count(),
        "Processed message"
    );

    (StatusCode::OK, Json(ProcessResponse::new(result, &text))).into_response()
}
