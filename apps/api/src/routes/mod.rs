pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::batch::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/batch/resumes", post(handlers::handle_batch_resumes))
        .route("/api/v1/resumes/render", post(handlers::handle_render_resume))
        .with_state(state)
}
