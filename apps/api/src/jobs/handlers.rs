//! Axum route handlers for the Jobs API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::jobs::models::JobRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FetchJobsQuery {
    pub keywords: String,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FetchJobsResponse {
    pub linkedin: Vec<JobRecord>,
}

/// GET /fetch-jobs?keywords=...&location=...
///
/// Always 200 for valid input: provider failures surface as an empty list.
pub async fn handle_fetch_jobs(
    State(state): State<AppState>,
    Query(params): Query<FetchJobsQuery>,
) -> Result<Json<FetchJobsResponse>, AppError> {
    if params.keywords.trim().is_empty() {
        return Err(AppError::Validation("keywords cannot be empty".to_string()));
    }

    let linkedin = state
        .jobs
        .fetch(&params.keywords, params.location.as_deref())
        .await;

    Ok(Json(FetchJobsResponse { linkedin }))
}
