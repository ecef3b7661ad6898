//! Canned-status HTTP server used as a load target.
//!
//! Every status endpoint answers `<code>\n` after an optional `delay`, which makes
//! latency and failure rates of a load run fully controllable from the URL.

use anyhow::Context;
use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use http_test_util::{status_path, CounterSnapshot, DelayQuery, RequestCounters, STATUS_CODES};
use std::fmt::Write;
use tokio::net::TcpListener;

#[derive(Clone)]
struct AppState {
    port: u16,
    counters: RequestCounters,
}

/// Builds the router; `port` is only used to render the endpoint listing.
pub fn router(port: u16) -> Router {
    let state = AppState {
        port,
        counters: RequestCounters::new(),
    };
    let mut codes: Router<AppState> = Router::new();
    for code in STATUS_CODES {
        codes = codes.route(
            &status_path(code),
            get(move |Query(query): Query<DelayQuery>| code_response(code, query)),
        );
    }
    let codes = codes
        .fallback(|Query(query): Query<DelayQuery>| code_response(StatusCode::NOT_FOUND, query))
        .layer(middleware::from_fn_with_state(state.clone(), track_requests));

    Router::new()
        .route("/", get(get_index))
        .route("/stats", get(get_stats))
        .merge(codes)
        .with_state(state)
}

/// Serves until the listener fails.
pub async fn serve(listener: TcpListener) -> anyhow::Result<()> {
    let port = listener
        .local_addr()
        .context("Failed to read listener address")?
        .port();
    axum::serve(listener, router(port))
        .await
        .context("Server terminated")
}

#[must_use]
pub fn endpoint_listing(port: u16) -> String {
    let mut out = String::from("\n\nAvailable Service Endpoints\n===========================\n\n");
    let paths = ["/".to_string(), "/stats".to_string()]
        .into_iter()
        .chain(STATUS_CODES.into_iter().map(status_path));
    for path in paths {
        let _ = writeln!(out, "curl -X GET localhost:{port}{path}");
    }
    out
}

#[inline]
async fn get_index(State(state): State<AppState>) -> String {
    endpoint_listing(state.port)
}

#[inline]
async fn get_stats(State(state): State<AppState>) -> Json<CounterSnapshot> {
    Json(state.counters.snapshot())
}

async fn code_response(code: StatusCode, query: DelayQuery) -> (StatusCode, String) {
    let mut body = format!("{}\n", code.as_u16());
    match query.parse() {
        Some(Ok(delay)) => tokio::time::sleep(delay).await,
        Some(Err(e)) => {
            let _ = writeln!(body, "invalid delay: {e}");
        }
        None => {}
    }
    (code, body)
}

async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let _in_flight = state.counters.begin();
    tracing::debug!(method = %request.method(), path = %request.uri().path(), "status request");
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn code_response_echoes_status() {
        let (code, body) = code_response(StatusCode::INTERNAL_SERVER_ERROR, DelayQuery::default()).await;
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, code);
        assert_eq!("500\n", body);
    }

    #[tokio::test]
    async fn code_response_sleeps_for_delay() {
        let query = DelayQuery {
            delay: Some("50ms".to_string()),
        };
        let start = Instant::now();
        let (code, body) = code_response(StatusCode::OK, query).await;
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(StatusCode::OK, code);
        assert_eq!("200\n", body);
    }

    #[tokio::test]
    async fn invalid_delay_is_reported_after_status_line() {
        let query = DelayQuery {
            delay: Some("later".to_string()),
        };
        let (code, body) = code_response(StatusCode::NOT_FOUND, query).await;
        assert_eq!(StatusCode::NOT_FOUND, code);
        assert!(body.starts_with("404\ninvalid delay: "), "{body}");
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn listing_names_every_endpoint() {
        let listing = endpoint_listing(5555);
        assert!(listing.contains("Available Service Endpoints"));
        for path in ["/", "/stats", "/200", "/404", "/500"] {
            assert!(
                listing.contains(&format!("curl -X GET localhost:5555{path}\n")),
                "missing {path} in {listing}"
            );
        }
    }
}
