use anyhow::{Context, Result};
use clap::Parser;
use mimalloc::MiMalloc;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use webclient::{ConfigError, RunSpec};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Send the same request from concurrent workers until the time is up
#[derive(Parser, Debug)]
#[command(name = "webclient", version, about)]
struct Cli {
    /// Target URL; http:// is assumed when no scheme is given
    url: String,

    /// Print a curl line and the result of every request sent by the first worker
    #[arg(short, long)]
    verbose: bool,

    /// Number of concurrent workers
    #[arg(short, long, default_value_t = 1)]
    concurrency: usize,

    /// How long to keep sending, e.g. 500ms, 30s, 1m30s
    #[arg(short = 't', long = "time", default_value = "0s", value_parser = humantime::parse_duration)]
    time: Duration,

    /// Request method
    #[arg(short = 'X', long = "request", default_value = "GET")]
    method: String,

    /// Extra request header as "Name: value", may be repeated
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body
    #[arg(short = 'd', long = "data")]
    data: Option<String>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn run_spec(&self) -> Result<RunSpec, ConfigError> {
        let mut spec = RunSpec::new(&self.url)?
            .with_method(&self.method)?
            .with_concurrency(self.concurrency)?
            .with_duration(self.time)
            .with_verbose(self.verbose);
        for line in &self.headers {
            spec = spec.with_header(line)?;
        }
        if let Some(data) = &self.data {
            spec = spec.with_body(data.clone());
        }
        Ok(spec)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let spec = match cli.run_spec() {
        Ok(spec) => spec,
        Err(e) => {
            println!("{e}");
            return ExitCode::from(255);
        }
    };
    match run_load(&spec, cli.json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{e:#}");
            ExitCode::from(255)
        }
    }
}

fn run_load(spec: &RunSpec, json: bool) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    let _guard = rt.enter();
    let report = rt.block_on(webclient::run(spec)).context("Load run failed")?;
    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{out}");
    } else {
        print!("{report}");
    }
    Ok(())
}
