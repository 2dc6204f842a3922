use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::controller::RunSnapshot;
use crate::AppState;

use super::AppError;

// ─── POST /api/run ───────────────────────────────────────────────

/// Opens a run and drives its rounds on a background task. Returns the
/// pending snapshot; progress arrives on `/api/run/stream`.
pub async fn start_run(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<RunSnapshot>), AppError> {
    // Failure is recorded in the controller's status and logged there
    let _ = state.controller.spawn_run()?;

    Ok((StatusCode::ACCEPTED, Json(state.controller.snapshot())))
}
