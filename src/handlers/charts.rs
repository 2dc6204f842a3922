use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::header,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::chart::{self, ChartMetric, Geometry};
use crate::AppState;

use super::AppError;

/// Widest chart we agree to draw, per side.
const MAX_SIDE: u32 = 4_000;

// ─── GET /api/charts/:file ───────────────────────────────────────
/// `processing-time.svg` or `end-to-end-time.svg`, optional `?width=&height=`.

pub async fn get_chart(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
    geometry: Result<Query<Geometry>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(geometry) = geometry?;
    let metric: ChartMetric = file
        .strip_suffix(".svg")
        .unwrap_or(&file)
        .parse()
        .map_err(AppError::NotFound)?;

    if geometry.width == 0
        || geometry.height == 0
        || geometry.width > MAX_SIDE
        || geometry.height > MAX_SIDE
    {
        return Err(AppError::BadRequest(format!(
            "width and height must be between 1 and {MAX_SIDE}"
        )));
    }

    let svg = chart::render(&state.controller.samples(), metric, geometry);
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}
