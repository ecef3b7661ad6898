use anyhow::{Context, Result};
use clap::Parser;
use mimalloc::MiMalloc;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Canned-status HTTP server: `/200`, `/404`, `/500`, each honouring `?delay=<duration>`
#[derive(Parser, Debug)]
#[command(name = "webservice", version, about)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 5555)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    bind: IpAddr,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    let _guard = rt.enter();
    rt.block_on(run_server(SocketAddr::new(args.bind, args.port)))
}

async fn run_server(addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "webservice listening");
    webservice::serve(listener).await
}
