use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

use super::RunSummary;
use crate::controller::RunSnapshot;
use crate::AppState;

// ─── GET /api/run ────────────────────────────────────────────────
/// Single JSON snapshot — useful for curl / debugging.

pub async fn get_run(State(state): State<Arc<AppState>>) -> Json<RunSnapshot> {
    Json(state.controller.snapshot())
}

// ─── GET /api/summary ────────────────────────────────────────────

pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<RunSummary> {
    Json(RunSummary::from_samples(&state.controller.samples()))
}

// ─── GET /api/run/stream ─────────────────────────────────────────
/// Server-Sent Events endpoint.
/// Emits a `snapshot` event with the current state on connect, then one
/// per published change. Intermediate states may be coalesced.

pub async fn run_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.controller.subscribe()).map(|snapshot| {
        let json = serde_json::to_string(&snapshot).unwrap_or_default();
        Ok(Event::default().event("snapshot").data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
