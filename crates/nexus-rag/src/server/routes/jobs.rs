//! Queue observability endpoint

use axum::{extract::State, Json};

use crate::processing::QueueStats;
use crate::server::state::AppState;

/// GET /api/jobs - ingestion queue statistics
pub async fn queue_stats(State(state): State<AppState>) -> Json<QueueStats> {
    Json(state.job_queue().stats())
}
