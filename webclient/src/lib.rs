//! Concurrent HTTP load generation.
//!
//! A [`RunSpec`] names a target, a method, a concurrency level and a duration.
//! [`run`] starts that many independent workers, each with its own HTTP
//! client, which send the same request back to back until the duration has
//! elapsed, and returns what they saw as a [`RunReport`].

mod attempt;
pub mod client;
mod controller;
pub mod error;
mod spec;
pub mod statistics;
pub mod template;
pub mod tls;
pub mod trace;
mod worker;

pub use attempt::{AttemptResult, StatusClass};
pub use controller::{run, run_with_trace};
pub use error::{AttemptError, ConfigError, RunError};
pub use spec::RunSpec;
pub use statistics::{AttemptStats, RunReport, WorkerStats};
pub use template::{render_curl, RequestTemplate};
pub use trace::TraceSink;
