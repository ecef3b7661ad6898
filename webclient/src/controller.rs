use crate::error::RunError;
use crate::spec::RunSpec;
use crate::statistics::RunReport;
use crate::tls::insecure_client_config;
use crate::trace::{self, TraceSink};
use crate::worker::Worker;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Runs `spec` to completion on the current tokio runtime.
///
/// Spawns one task per concurrency slot and returns once every one of them has
/// reached its deadline. Failed attempts only show up in the report; the
/// errors returned here are a TLS setup failure, before anything is sent, and
/// a worker task that died, reported after all the others were joined.
pub async fn run(spec: &RunSpec) -> Result<RunReport, RunError> {
    run_with_trace(spec, trace::stdout()).await
}

/// Like [`run`], with the verbose worker's lines going to `sink` instead of stdout.
pub async fn run_with_trace(spec: &RunSpec, sink: TraceSink) -> Result<RunReport, RunError> {
    let tls = Arc::new(insecure_client_config()?);
    let template = Arc::new(spec.template());
    let concurrency = spec.concurrency();
    info!(
        url = %spec.target(),
        method = %spec.method(),
        concurrency,
        duration = ?spec.duration(),
        "starting run"
    );

    let start = Instant::now();
    let mut tasks = Vec::with_capacity(concurrency);
    for id in 0..concurrency {
        let worker = Worker {
            id,
            template: template.clone(),
            tls: tls.clone(),
            start,
            duration: spec.duration(),
            trace: spec.traces_worker(id).then(|| sink.clone()),
        };
        tasks.push(tokio::spawn(worker.run()));
    }

    let mut workers = Vec::with_capacity(concurrency);
    let mut lost = Vec::new();
    for (id, task) in tasks.into_iter().enumerate() {
        match task.await {
            Ok(stats) => workers.push(stats),
            Err(e) => {
                error!(worker = id, error = %e, "worker did not finish");
                lost.push(e.to_string());
            }
        }
    }
    let wall_time = start.elapsed();

    if let Some(first) = lost.first() {
        return Err(RunError::WorkerLost {
            failed: lost.len(),
            concurrency,
            first: first.clone(),
        });
    }

    let report = RunReport { wall_time, workers };
    let totals = report.totals();
    info!(
        wall_time = ?report.wall_time,
        attempts = totals.attempts,
        failures = totals.failures,
        "run finished"
    );
    Ok(report)
}
