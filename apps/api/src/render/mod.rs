//! Rendering resource pool.
//!
//! A `RenderEngine` is one running headless-browser instance that multiplexes
//! isolated `RenderContext`s. The `RenderPool` hands contexts out through a
//! `ContextLease`, which is released on every exit path, and owns the engine
//! only in owned mode.

pub mod gotenberg;
pub mod page;
pub mod pool;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use gotenberg::GotenbergLauncher;
pub use page::{Margins, PageConfig, PageFormat};
pub use pool::RenderPool;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("engine launch failed: {0}")]
    Launch(String),

    #[error("engine is closed")]
    EngineClosed,

    #[error("engine error: {0}")]
    Engine(String),

    #[error("render timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("render task panicked")]
    Panicked,
}

/// Raw rendered bytes plus their measured size. Consumed once by the validator.
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    pub bytes: Bytes,
    pub size: usize,
}

impl RenderedArtifact {
    pub fn new(bytes: Bytes) -> Self {
        let size = bytes.len();
        Self { bytes, size }
    }

    pub fn size_mib(&self) -> f64 {
        self.size as f64 / BYTES_PER_MIB
    }
}

/// An isolated, single-owner handle into a running engine.
#[async_trait]
pub trait RenderContext: Send {
    async fn render(&mut self, html: &str, page: &PageConfig) -> Result<Bytes, RenderError>;

    async fn close(&mut self) -> Result<(), RenderError>;
}

/// One running engine instance. Safe to share across tasks; each task
/// opens its own context.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>, RenderError>;

    async fn close(&self) -> Result<(), RenderError>;
}

/// Starts engine instances.
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn RenderEngine>, RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_size_in_mib() {
        let artifact = RenderedArtifact::new(Bytes::from(vec![0u8; 3 * 512 * 1024]));
        assert_eq!(artifact.size, 1_572_864);
        assert!((artifact.size_mib() - 1.5).abs() < f64::EPSILON);
    }
}
