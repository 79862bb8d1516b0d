//! Artifact persistence: upload, then record the pointer on the job.
//!
//! The upload is job-fatal. The two pointer columns are written as
//! independent updates; a failure in one is reported as a warning and never
//! undoes or blocks the other. A job whose URL is fresh but whose filename is
//! stale is an accepted transient state.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::artifact::job_store::JobStore;
use crate::artifact::storage::{ObjectStore, UploadError, PDF_CONTENT_TYPE};
use crate::models::job::JobField;

/// A failed single-column update. Non-fatal to the job outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistFieldError {
    pub column: &'static str,
    pub message: String,
}

impl fmt::Display for PersistFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to persist {}: {}", self.column, self.message)
    }
}

#[derive(Debug, Clone)]
pub struct PersistedArtifact {
    pub url: String,
    pub field_errors: Vec<PersistFieldError>,
}

/// `{SafeName}_CV_{jobId8}_{YYYYMMDDTHHMMSS}.pdf`.
pub fn artifact_filename(full_name: &str, job_id: Uuid, now: DateTime<Utc>) -> String {
    let cleaned: String = full_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    let safe_name = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    let safe_name = if safe_name.is_empty() { "CV".to_string() } else { safe_name };

    let id = job_id.simple().to_string();
    format!(
        "{}_CV_{}_{}.pdf",
        safe_name,
        &id[..8],
        now.format("%Y%m%dT%H%M%S")
    )
}

pub async fn persist(
    objects: &dyn ObjectStore,
    jobs: &dyn JobStore,
    job_id: Uuid,
    filename: &str,
    bytes: Bytes,
) -> Result<PersistedArtifact, UploadError> {
    let url = objects.put(filename, bytes, PDF_CONTENT_TYPE).await?;

    let url_field = JobField::ArtifactUrl(url.clone());
    let filename_field = JobField::ArtifactFilename(filename.to_string());
    let url_column = url_field.column();
    let filename_column = filename_field.column();

    let (url_result, filename_result) = tokio::join!(
        jobs.update_field(job_id, url_field),
        jobs.update_field(job_id, filename_field),
    );

    let field_errors: Vec<PersistFieldError> = [(url_column, url_result), (filename_column, filename_result)]
        .into_iter()
        .filter_map(|(column, result)| {
            result.err().map(|e| PersistFieldError {
                column,
                message: e.to_string(),
            })
        })
        .collect();

    for error in &field_errors {
        warn!(job_id = %job_id, "{error}");
    }
    info!(job_id = %job_id, "artifact persisted at {url}");

    Ok(PersistedArtifact { url, field_errors })
}
