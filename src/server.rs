use axum::{
    middleware as axum_mw,
    routing::{get, post, put},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::handlers;
use crate::metrics::stream;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes, middleware, and static serving.
pub fn create_router(state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        // ── Selection ───────────────────────────────────────────
        .route("/api/selection", get(handlers::selection::get_selection))
        .route(
            "/api/selection/topology/:name",
            post(handlers::selection::toggle_topology),
        )
        .route(
            "/api/selection/queries",
            put(handlers::selection::set_query_count),
        )
        // ── Run control ─────────────────────────────────────────
        .route(
            "/api/run",
            get(stream::get_run).post(handlers::run::start_run),
        )
        .route("/api/run/stream", get(stream::run_stream))
        // ── Rendering ───────────────────────────────────────────
        .route("/api/charts/:file", get(handlers::charts::get_chart))
        .route("/api/summary", get(stream::get_summary))
        .with_state(state)
        // ── Dashboard ───────────────────────────────────────────
        .fallback_service(ServeDir::new(static_dir))
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::source::EdgeReport;
    use crate::controller::{Controller, FetchError, MeasurementEndpoint, QueryCount, Topology};
    use crate::middleware::timing::{RESPONSE_TIME_HEADER, SERVER_TIMING_HEADER};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::Value;
    use std::time::Duration;
    use tokio_stream::StreamExt;
    use tower::ServiceExt;

    struct SlowEndpoint(Duration);

    #[async_trait]
    impl MeasurementEndpoint for SlowEndpoint {
        async fn query(&self, _: Topology, _: QueryCount) -> Result<EdgeReport, FetchError> {
            tokio::time::sleep(self.0).await;
            Ok(EdgeReport {
                duration: 3.0,
                is_cold_start: true,
            })
        }
    }

    fn app(delay: Duration) -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState {
            controller: Arc::new(Controller::new(Arc::new(SlowEndpoint(delay)))),
        });
        (create_router(state.clone(), Path::new("static")), state)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn toggle_and_query_count_update_selection() {
        let (app, _) = app(Duration::ZERO);

        let (status, body) = call(&app, Method::POST, "/api/selection/topology/regional", None).await;
        assert_eq!(status, StatusCode::OK);
        let sel: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(sel["global"], true);
        assert_eq!(sel["regional"], true);
        assert_eq!(sel["query_count"], 1);

        let (status, body) = call(
            &app,
            Method::PUT,
            "/api/selection/queries",
            Some(serde_json::json!({ "query_count": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let sel: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(sel["query_count"], 5);
        assert_eq!(sel["regional"], true);
    }

    #[tokio::test]
    async fn invalid_selection_input_is_rejected() {
        let (app, _) = app(Duration::ZERO);

        let (status, _) = call(&app, Method::POST, "/api/selection/topology/edge", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app,
            Method::PUT,
            "/api/selection/queries",
            Some(serde_json::json!({ "query_count": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["status"], 400);

        // Outside u8, negative, and string-typed counts get the same JSON error
        for bad in [
            serde_json::json!({ "query_count": 256 }),
            serde_json::json!({ "query_count": -1 }),
            serde_json::json!({ "query_count": "5" }),
        ] {
            let (status, body) = call(&app, Method::PUT, "/api/selection/queries", Some(bad.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {bad}");
            let err: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(err["status"], 400);
            assert!(err["error"].is_string());
        }

        let (status, _) = call(&app, Method::GET, "/api/selection", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_chart_geometry_is_a_json_bad_request() {
        let (app, _) = app(Duration::ZERO);

        let (status, body) = call(&app, Method::GET, "/api/charts/processing-time.svg?width=abc", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["status"], 400);
    }

    #[tokio::test]
    async fn run_stream_opens_with_current_snapshot() {
        let (app, state) = app(Duration::from_secs(5));
        state.controller.toggle_topology(Topology::Regional);
        let _ = state.controller.spawn_run().unwrap();

        let req = Request::builder().uri("/api/run/stream").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

        let mut frames = response.into_body().into_data_stream();
        let first = tokio::time::timeout(Duration::from_secs(1), frames.next())
            .await
            .expect("first frame")
            .expect("stream open")
            .unwrap();
        let frame = String::from_utf8(first.to_vec()).unwrap();

        assert!(frame.starts_with("event: snapshot\n"), "frame: {frame}");
        let data = frame
            .lines()
            .find_map(|l| l.strip_prefix("data: "))
            .expect("data line");
        let snap: Value = serde_json::from_str(data).unwrap();
        assert_eq!(snap["status"]["state"], "pending");
        assert_eq!(snap["selection"]["regional"], true);
    }

    #[tokio::test]
    async fn api_responses_carry_timing_headers() {
        let (app, _) = app(Duration::ZERO);

        let req = Request::builder().uri("/api/selection").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();

        let us = response.headers()[RESPONSE_TIME_HEADER].to_str().unwrap();
        assert!(us.parse::<u64>().is_ok());
        let timing = response.headers()[SERVER_TIMING_HEADER].to_str().unwrap();
        assert!(timing.starts_with("app;dur="));
    }

    #[tokio::test]
    async fn start_requires_a_topology() {
        let (app, state) = app(Duration::ZERO);
        state.controller.toggle_topology(Topology::Global);

        let (status, _) = call(&app, Method::POST, "/api/run", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn second_start_while_pending_conflicts() {
        let (app, _) = app(Duration::from_secs(5));

        let (status, body) = call(&app, Method::POST, "/api/run", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let snap: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(snap["status"]["state"], "pending");
        assert_eq!(snap["samples"].as_array().unwrap().len(), 0);

        let (status, _) = call(&app, Method::POST, "/api/run", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn completed_run_is_visible_in_snapshot_chart_and_summary() {
        let (app, state) = app(Duration::from_millis(1));
        state.controller.start_run().await.unwrap();

        let (status, body) = call(&app, Method::GET, "/api/run", None).await;
        assert_eq!(status, StatusCode::OK);
        let snap: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(snap["status"]["state"], "idle");
        let samples = snap["samples"].as_array().unwrap();
        assert_eq!(samples.len(), 5);
        assert_eq!(samples[4]["fetchNum"], 5);
        assert_eq!(samples[0]["global_coldStart"], true);
        assert!(samples[0].get("regional_processingTime").is_none());

        let (status, body) = call(&app, Method::GET, "/api/charts/processing-time.svg?width=400", None).await;
        assert_eq!(status, StatusCode::OK);
        let svg = String::from_utf8(body).unwrap();
        assert!(svg.contains(r#"width="400" height="500""#));
        assert!(svg.contains(r#"data-key="global_processingTime""#));

        let (status, body) = call(&app, Method::GET, "/api/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        let summary: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(summary["global"]["cold_starts"], 5);
        assert!(summary["regional"].is_null());
    }

    #[tokio::test]
    async fn unknown_chart_is_not_found() {
        let (app, _) = app(Duration::ZERO);

        let (status, _) = call(&app, Method::GET, "/api/charts/latency.svg", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, Method::GET, "/api/charts/end-to-end-time.svg?width=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
