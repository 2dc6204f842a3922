use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

pub const RESPONSE_TIME_HEADER: HeaderName = HeaderName::from_static("x-response-time-us");
pub const SERVER_TIMING_HEADER: HeaderName = HeaderName::from_static("server-timing");

/// Stamps every response with how long this server spent on it, and logs
/// API requests at a level matching the status class. The run stream is
/// long-lived and not logged.
pub async fn timing_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();

    stamp(&mut response, elapsed);

    if !path.starts_with("/api/") || path.ends_with("/stream") {
        return response;
    }

    let status = response.status();
    let us = elapsed.as_micros() as u64;
    if status.is_server_error() {
        error!(status = status.as_u16(), %method, %path, us, "request");
    } else if status.is_client_error() {
        warn!(status = status.as_u16(), %method, %path, us, "request");
    } else {
        info!(status = status.as_u16(), %method, %path, us, "request");
    }

    response
}

fn stamp(response: &mut Response, elapsed: Duration) {
    let headers = response.headers_mut();
    headers.insert(
        RESPONSE_TIME_HEADER,
        HeaderValue::from(elapsed.as_micros() as u64),
    );
    // `dur` is milliseconds per the Server-Timing grammar
    if let Ok(value) = HeaderValue::from_str(&format!(
        "app;dur={:.3}",
        elapsed.as_secs_f64() * 1000.0
    )) {
        headers.insert(SERVER_TIMING_HEADER, value);
    }
}
