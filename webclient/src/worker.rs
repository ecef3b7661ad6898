use crate::attempt::AttemptResult;
use crate::client::HttpClient;
use crate::statistics::WorkerStats;
use crate::template::{render_curl, RequestTemplate};
use crate::trace::TraceSink;
use rustls::ClientConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// One concurrency slot: sends the template back to back until the deadline.
pub(crate) struct Worker {
    pub(crate) id: usize,
    pub(crate) template: Arc<RequestTemplate>,
    pub(crate) tls: Arc<ClientConfig>,
    pub(crate) start: Instant,
    pub(crate) duration: Duration,
    /// Set only for the workers whose traffic is traced.
    pub(crate) trace: Option<TraceSink>,
}

impl Worker {
    /// The deadline is only checked after an attempt completes, so every worker
    /// sends at least once and never abandons a request in flight.
    pub(crate) async fn run(self) -> WorkerStats {
        // Lives exactly as long as the loop; its pool is never shared.
        let mut client = HttpClient::new(&self.tls);
        let mut stats = WorkerStats::new(self.id);
        debug!(worker = self.id, "worker started");
        loop {
            let request = self.template.instantiate();
            if let Some(sink) = &self.trace {
                sink(self.id, &render_curl(&request));
            }

            let (elapsed, response) = run_timed(client.send_recv(request)).await;
            let attempt = AttemptResult::classify(elapsed, response);
            if let Some(sink) = &self.trace {
                sink(self.id, &attempt.trace_line());
            }
            stats.record(&attempt);

            if self.start.elapsed() > self.duration {
                break;
            }
        }
        debug!(
            worker = self.id,
            attempts = stats.stats.attempts,
            failures = stats.stats.failures,
            "worker done"
        );
        stats
    }
}

#[inline]
async fn run_timed<T, F: Future<Output = T>>(fut: F) -> (Duration, T) {
    let start = Instant::now();
    let res = fut.await;
    (start.elapsed(), res)
}
