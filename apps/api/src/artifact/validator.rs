use thiserror::Error;

use crate::render::RenderedArtifact;

/// Hard ceiling on artifact size. Larger artifacts are rejected, not re-rendered.
pub const MAX_ARTIFACT_MIB: f64 = 2.0;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("artifact exceeds 2MB limit: {size_mib:.2}MB")]
    TooLarge { size_mib: f64 },

    #[error("artifact is empty")]
    Empty,
}

/// Checks the artifact against the size ceiling and returns its size in MiB.
pub fn validate(artifact: &RenderedArtifact) -> Result<f64, ValidationError> {
    if artifact.size == 0 {
        return Err(ValidationError::Empty);
    }
    let size_mib = artifact.size_mib();
    if size_mib > MAX_ARTIFACT_MIB {
        return Err(ValidationError::TooLarge { size_mib });
    }
    Ok(size_mib)
}
