use std::sync::Arc;

use crate::batch::BatchCoordinator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the pipeline collaborators and the engine launcher.
    pub coordinator: Arc<BatchCoordinator>,
}
