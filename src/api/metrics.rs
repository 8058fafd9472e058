use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_COUNT: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNT: AtomicU64 = AtomicU64::new(0);
static MESSAGES_RELAYED: AtomicU64 = AtomicU64::new(0);
static OPEN_SOCKETS: AtomicU64 = AtomicU64::new(0);

pub fn increment_request_count() {
    REQUEST_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_error_count() {
    ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_messages_relayed() {
    MESSAGES_RELAYED.fetch_add(1, Ordering::Relaxed);
}

pub fn socket_opened() {
    OPEN_SOCKETS.fetch_add(1, Ordering::Relaxed);
}

pub fn socket_closed() {
    // Saturating: never wraps below zero
    let _ = OPEN_SOCKETS.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub http_requests_total: u64,
    pub http_errors_total: u64,
    pub ws_messages_relayed_total: u64,
    pub ws_open_connections: u64,
}

impl MetricsResponse {
    fn snapshot() -> Self {
        MetricsResponse {
            http_requests_total: REQUEST_COUNT.load(Ordering::Relaxed),
            http_errors_total: ERROR_COUNT.load(Ordering::Relaxed),
            ws_messages_relayed_total: MESSAGES_RELAYED.load(Ordering::Relaxed),
            ws_open_connections: OPEN_SOCKETS.load(Ordering::Relaxed),
        }
    }

    fn to_prometheus(&self) -> String {
        format!(
            "# HELP http_requests_total Total number of HTTP requests\n\
             # TYPE http_requests_total counter\n\
             http_requests_total {}\n\
             \n\
             # HELP http_errors_total Total number of HTTP errors\n\
             # TYPE http_errors_total counter\n\
             http_errors_total {}\n\
             \n\
             # HELP ws_messages_relayed_total Direct messages pushed over websockets\n\
             # TYPE ws_messages_relayed_total counter\n\
             ws_messages_relayed_total {}\n\
             \n\
             # HELP ws_open_connections Currently open websocket connections\n\
             # TYPE ws_open_connections gauge\n\
             ws_open_connections {}\n",
            self.http_requests_total,
            self.http_errors_total,
            self.ws_messages_relayed_total,
            self.ws_open_connections
        )
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus text metrics", body = MetricsResponse)
    )
)]
pub async fn get_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(MetricsResponse::snapshot().to_prometheus())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_series() {
        let text = MetricsResponse {
            http_requests_total: 7,
            http_errors_total: 1,
            ws_messages_relayed_total: 3,
            ws_open_connections: 2,
        }
        .to_prometheus();

        assert!(text.contains("http_requests_total 7\n"));
        assert!(text.contains("http_errors_total 1\n"));
        assert!(text.contains("ws_messages_relayed_total 3\n"));
        assert!(text.contains("# TYPE ws_open_connections gauge\nws_open_connections 2\n"));
    }
}
