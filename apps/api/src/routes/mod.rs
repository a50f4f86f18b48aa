pub mod health;
pub mod jobs;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::applications::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Job catalog
        .route("/api/jobs", get(jobs::handle_list_jobs))
        .route("/api/jobs/:id", get(jobs::handle_get_job))
        // Intake
        .route("/api/apply", post(handlers::handle_apply))
        // Read side
        .route("/api/applications", get(handlers::handle_list_applications))
        .route(
            "/api/applications/:job_id",
            get(handlers::handle_list_applications_for_job),
        )
        .route("/api/preview/:filename", get(handlers::handle_preview))
        .route("/api/file-info/:filename", get(handlers::handle_file_info))
        .route("/download/*filename", get(handlers::handle_download))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
