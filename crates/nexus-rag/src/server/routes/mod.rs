//! API routes

pub mod chat;
pub mod documents;
pub mod jobs;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};

use super::state::AppState;

/// Build all authenticated API routes
pub fn api_routes(state: AppState, max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Document management
        .route(
            "/documents",
            get(documents::list_documents)
                .post(documents::upload_document)
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/documents/:id", delete(documents::delete_document))
        // Ingestion trigger / reprocess
        .route("/process", post(documents::process_document))
        // Chat
        .route("/chat", post(chat::chat))
        // Queue observability
        .route("/jobs", get(jobs::queue_stats))
        .layer(middleware::from_fn_with_state(state, super::auth::require_auth))
}
