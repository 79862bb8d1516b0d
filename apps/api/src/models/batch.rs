use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::{Job, SourceRecord};
use crate::render::{Margins, PageConfig, PageFormat};

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub gpa: Option<String>,
}

/// Header and static sections shared by every resume in a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub summary: Vec<String>,
    #[serde(default)]
    pub technical_skills: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub certificates: Vec<String>,
}

/// Shared rendering configuration for a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConfig {
    #[serde(default)]
    pub format: PageFormat,
    #[serde(default)]
    pub margins: Margins,
    #[serde(default = "enabled")]
    pub include_personal_info: bool,
    #[serde(default = "enabled")]
    pub include_summary: bool,
    #[serde(default = "enabled")]
    pub include_skills: bool,
    #[serde(default = "enabled")]
    pub include_education: bool,
    #[serde(default = "enabled")]
    pub include_certificates: bool,
    #[serde(default = "enabled")]
    pub include_experiences: bool,
    pub personal_info: PersonalInfo,
}

impl BatchConfig {
    pub fn page(&self) -> PageConfig {
        PageConfig {
            format: self.format,
            margins: self.margins,
        }
    }

    #[cfg(test)]
    pub fn new(personal_info: PersonalInfo) -> Self {
        Self {
            format: PageFormat::default(),
            margins: Margins::default(),
            include_personal_info: true,
            include_summary: true,
            include_skills: true,
            include_education: true,
            include_certificates: true,
            include_experiences: true,
            personal_info,
        }
    }
}

/// One unit of batch work: the job and the records that feed its experience section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJob {
    pub job: Job,
    #[serde(default)]
    pub source_records: Vec<SourceRecord>,
}

/// Batch request body. Both fields are optional at the serde level so the
/// handler can reject a missing list or config with a 400 and a clear message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub jobs: Option<Vec<BatchJob>>,
    pub config: Option<BatchConfig>,
}

/// Single-job request body (owned engine mode).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderJobRequest {
    pub job: Option<BatchJob>,
    pub config: Option<BatchConfig>,
}

/// A source record whose rewrite failed and was left out of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSkip {
    pub record_id: Uuid,
    pub reason: String,
}

/// Terminal outcome of one job's pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub job_id: Uuid,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Non-empty when the experience section was built from fewer records
    /// than were supplied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_records: Vec<RecordSkip>,
    /// Persistence problems that did not change the outcome.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl JobOutcome {
    pub fn failed(job_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            job_id,
            success: false,
            artifact_url: None,
            filename: None,
            file_size: None,
            error: Some(error.into()),
            skipped_records: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Aggregate returned by one batch call. Never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<JobOutcome>,
}

impl BatchResult {
    pub fn from_outcomes(results: Vec<JobOutcome>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }
}
