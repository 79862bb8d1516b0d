//! Per-job pipeline: Analyze → Optimize → Assemble → Render → Validate →
//! Persist, strictly sequential within one job.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::artifact::{JobStore, ObjectStore, UploadError, ValidationError};
use crate::document::AssemblyError;
use crate::render::RenderError;

pub mod analyze;
pub mod job;
pub mod optimize;
pub mod prompts;

pub use analyze::{AnalysisError, JobAnalyzer, LlmJobAnalyzer};
pub use job::{run_job, RenderTarget};
pub use optimize::{ContentRewriter, LlmRewriter, OptimizedContent};

/// External collaborators shared by every job in the process.
#[derive(Clone)]
pub struct PipelineDeps {
    pub analyzer: Arc<dyn JobAnalyzer>,
    pub rewriter: Arc<dyn ContentRewriter>,
    pub objects: Arc<dyn ObjectStore>,
    pub jobs: Arc<dyn JobStore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Pending,
    Analyzing,
    Optimizing,
    Assembling,
    Rendering,
    Validating,
    Persisting,
    Succeeded,
    Failed,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::Pending => "pending",
            JobStage::Analyzing => "analyzing",
            JobStage::Optimizing => "optimizing",
            JobStage::Assembling => "assembling",
            JobStage::Rendering => "rendering",
            JobStage::Validating => "validating",
            JobStage::Persisting => "persisting",
            JobStage::Succeeded => "succeeded",
            JobStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Job-fatal failures. The display string is the job's reported error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),
}
