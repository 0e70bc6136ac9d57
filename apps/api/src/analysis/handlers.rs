//! Axum route handlers for the Analysis API.

use std::time::Duration;

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderName},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;

use crate::analysis::pipeline::AnalysisPipeline;
use crate::analysis::steps::{AnalysisStep, StepOutput};
use crate::errors::AppError;
use crate::pdf::{extract_text, PDF_CONTENT_TYPE};
use crate::state::AppState;

/// Multipart field that carries the resume.
const UPLOAD_FIELD: &str = "file";

pub const NOT_A_PDF_MESSAGE: &str = "Only PDF files are supported.";

/// A single step can wait on the LLM for minutes; idle proxies must not drop
/// the stream in the meantime.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    pub text: String,
    pub aspect: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeTextResponse {
    pub aspect: AnalysisStep,
    pub result: StepOutput,
}

#[derive(Debug, Serialize)]
pub struct ExtractTextResponse {
    pub text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /analyze-resume
///
/// Multipart PDF upload. Responds with a server-sent event stream: one
/// `processing` and one `complete` event per step, then a `done` event
/// carrying the whole bundle.
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let pdf = read_pdf_upload(multipart).await?;
    let resume_text = extract_text(pdf).await?;
    Ok(analysis_stream_response(state.pipeline.clone(), resume_text))
}

/// POST /analyze-text
///
/// Runs one step against already-extracted text.
pub async fn handle_analyze_text(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeTextRequest>,
) -> Result<Json<AnalyzeTextResponse>, AppError> {
    let aspect: AnalysisStep = request.aspect.parse().map_err(AppError::Validation)?;
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let result = state.pipeline.run_step(aspect, &request.text).await;
    Ok(Json(AnalyzeTextResponse { aspect, result }))
}

/// POST /extract-text
///
/// Multipart PDF upload; returns the extracted text without analysing it.
pub async fn handle_extract_text(multipart: Multipart) -> Result<Json<ExtractTextResponse>, AppError> {
    let pdf = read_pdf_upload(multipart).await?;
    let text = extract_text(pdf).await?;
    Ok(Json(ExtractTextResponse { text }))
}

/// Wraps a pipeline run as an SSE response. Every event is a single
/// `data: <json>` frame; proxies are told not to buffer the stream, and a
/// comment frame is sent while a step is still running.
pub fn analysis_stream_response(pipeline: AnalysisPipeline, resume_text: String) -> Response {
    let events = pipeline
        .stream(resume_text)
        .map(|event| Event::default().json_data(event));

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(events).keep_alive(
            KeepAlive::new()
                .interval(KEEP_ALIVE_INTERVAL)
                .text("keep-alive"),
        ),
    )
        .into_response()
}

/// Pulls the `file` field out of the upload, rejecting anything that is not
/// declared as `application/pdf` before reading its body.
async fn read_pdf_upload(mut multipart: Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if field.content_type() != Some(PDF_CONTENT_TYPE) {
            return Err(AppError::Validation(NOT_A_PDF_MESSAGE.to_string()));
        }
        return Ok(field.bytes().await?);
    }

    Err(AppError::Validation(format!(
        "No file uploaded. Send the resume in the '{UPLOAD_FIELD}' form field."
    )))
}
