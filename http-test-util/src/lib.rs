pub mod drain;

use bytes::Bytes;
use http_body_util::Full;
use hyper::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Status codes the test server answers with a dedicated `/<code>` endpoint.
pub const STATUS_CODES: [StatusCode; 3] = [
    StatusCode::OK,
    StatusCode::NOT_FOUND,
    StatusCode::INTERNAL_SERVER_ERROR,
];

/// Name of the query parameter that makes the test server sleep before responding.
pub const DELAY_PARAM: &str = "delay";

#[inline]
pub fn empty_body() -> Full<Bytes> {
    Full::new(Bytes::new())
}

#[inline]
pub fn byte_body<B: Into<Bytes>>(bytes: B) -> Full<Bytes> {
    Full::new(bytes.into())
}

#[inline]
#[must_use]
pub fn status_path(code: StatusCode) -> String {
    format!("/{}", code.as_u16())
}

/// Path and query for a fixed-status endpoint, e.g. `/500?delay=300ms`.
#[must_use]
pub fn status_path_with_delay(code: StatusCode, delay: Duration) -> String {
    format!(
        "{}?{DELAY_PARAM}={}",
        status_path(code),
        humantime::format_duration(delay)
    )
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct DelayQuery {
    pub delay: Option<String>,
}

impl DelayQuery {
    /// `None` when no delay was asked for, or an empty one.
    pub fn parse(&self) -> Option<Result<Duration, humantime::DurationError>> {
        self.delay
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(humantime::parse_duration)
    }
}

/// Counts requests passing through the status endpoints of the test server.
#[derive(Clone, Default)]
pub struct RequestCounters {
    in_flight: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
}

impl RequestCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a request as started; the returned guard marks it finished on drop.
    #[inline]
    #[must_use]
    pub fn begin(&self) -> InFlightGuard {
        self.total.fetch_add(1, Ordering::AcqRel);
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        InFlightGuard {
            in_flight: self.in_flight.clone(),
        }
    }

    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            in_flight: self.in_flight.load(Ordering::Acquire),
            total: self.total.load(Ordering::Acquire),
        }
    }
}

pub struct InFlightGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CounterSnapshot {
    pub in_flight: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_path_uses_humantime_syntax() {
        assert_eq!(
            "/500?delay=300ms",
            status_path_with_delay(StatusCode::INTERNAL_SERVER_ERROR, Duration::from_millis(300))
        );
        assert_eq!("/200", status_path(StatusCode::OK));
    }

    #[test]
    fn delay_query_parses_duration_strings() {
        let q = DelayQuery {
            delay: Some("1s 500ms".to_string()),
        };
        assert_eq!(Some(Duration::from_millis(1500)), q.parse().map(Result::unwrap));
        assert!(DelayQuery::default().parse().is_none());
        assert!(DelayQuery { delay: Some(String::new()) }.parse().is_none());
        let bad = DelayQuery {
            delay: Some("soon".to_string()),
        };
        assert!(matches!(bad.parse(), Some(Err(_))));
    }

    #[test]
    fn counters_track_in_flight_and_total() {
        let counters = RequestCounters::new();
        let first = counters.begin();
        let second = counters.begin();
        assert_eq!(CounterSnapshot { in_flight: 2, total: 2 }, counters.snapshot());
        drop(first);
        assert_eq!(CounterSnapshot { in_flight: 1, total: 2 }, counters.snapshot());
        drop(second);
        let snap = counters.snapshot();
        assert_eq!(0, snap.in_flight);
        let json = serde_json::to_string(&snap).unwrap();
        assert_eq!(r#"{"in_flight":0,"total":2}"#, json);
    }
}
