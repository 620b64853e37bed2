//! Request logging.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use log::{info, warn};
use std::time::Instant;

/// Logs one `event=http_request` line per request.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();
    if status.is_server_error() {
        warn!(
            "event=http_request module=web status=error method={method} path={path} code={} duration_ms={elapsed_ms}",
            status.as_u16()
        );
    } else {
        info!(
            "event=http_request module=web status=ok method={method} path={path} code={} duration_ms={elapsed_ms}",
            status.as_u16()
        );
    }
    response
}
