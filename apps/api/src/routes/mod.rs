pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::jobs::handlers as jobs;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        // Analysis API
        .route("/analyze-resume", post(analysis::handle_analyze_resume))
        .route("/analyze-text", post(analysis::handle_analyze_text))
        .route("/extract-text", post(analysis::handle_extract_text))
        // Jobs API
        .route("/fetch-jobs", get(jobs::handle_fetch_jobs))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
