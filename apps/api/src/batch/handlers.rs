//! Axum route handlers for the batch and single-job resume endpoints.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::info;

use crate::errors::AppError;
use crate::models::batch::{BatchConfig, BatchRequest, BatchResult, JobOutcome, RenderJobRequest};
use crate::state::AppState;

/// POST /api/v1/batch/resumes
///
/// Renders one resume per job against a shared engine. Job failures are
/// reported per job in the body; only a structurally invalid request is a 400.
pub async fn handle_batch_resumes(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResult>, AppError> {
    let Json(req) = payload?;

    let jobs = req
        .jobs
        .filter(|jobs| !jobs.is_empty())
        .ok_or_else(|| AppError::Validation("jobs must be a non-empty list".to_string()))?;
    let config = require_config(req.config)?;

    info!("Batch resume request: {} jobs", jobs.len());
    Ok(Json(state.coordinator.run_batch(jobs, config).await))
}

/// POST /api/v1/resumes/render
///
/// Renders a single job on its own engine instance.
pub async fn handle_render_resume(
    State(state): State<AppState>,
    payload: Result<Json<RenderJobRequest>, JsonRejection>,
) -> Result<Json<JobOutcome>, AppError> {
    let Json(req) = payload?;

    let job = req
        .job
        .ok_or_else(|| AppError::Validation("job is required".to_string()))?;
    let config = require_config(req.config)?;

    info!(job_id = %job.job.id, "Single resume request");
    Ok(Json(state.coordinator.run_single(job, config).await))
}

fn require_config(config: Option<BatchConfig>) -> Result<BatchConfig, AppError> {
    let config = config.ok_or_else(|| AppError::Validation("config is required".to_string()))?;
    if config.personal_info.full_name.trim().is_empty() {
        return Err(AppError::Validation(
            "full name is required for resume generation".to_string(),
        ));
    }
    Ok(config)
}
