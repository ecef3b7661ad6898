use std::sync::Arc;

/// Receives every curl and result line a tracing worker produces, tagged with
/// that worker's id, in the order the worker produced them.
pub type TraceSink = Arc<dyn Fn(usize, &str) + Send + Sync>;

/// Prints each line to stdout.
#[must_use]
pub fn stdout() -> TraceSink {
    Arc::new(|_: usize, line: &str| println!("{line}"))
}
