use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::controller::{QueryCount, Selection, Topology};
use crate::AppState;

use super::AppError;

#[derive(Debug, Deserialize)]
pub struct QueryCountBody {
    pub query_count: u8,
}

// ─── GET /api/selection ──────────────────────────────────────────

pub async fn get_selection(State(state): State<Arc<AppState>>) -> Json<Selection> {
    Json(state.controller.selection())
}

// ─── POST /api/selection/topology/:name ──────────────────────────

pub async fn toggle_topology(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Selection>, AppError> {
    let topology = name
        .parse::<Topology>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(state.controller.toggle_topology(topology)))
}

// ─── PUT /api/selection/queries ──────────────────────────────────

pub async fn set_query_count(
    State(state): State<Arc<AppState>>,
    body: Result<Json<QueryCountBody>, JsonRejection>,
) -> Result<Json<Selection>, AppError> {
    // Out-of-range and mistyped numbers are rejected before `try_from`
    let Json(body) = body?;
    let query_count =
        QueryCount::try_from(body.query_count).map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(state.controller.set_query_count(query_count)))
}
