//! `rfplayer-bridge` binary.

use std::process::ExitCode;

use clap::Parser;
use rfplayer_bridge::cli::Cli;
use rfplayer_bridge::{
    serve, spawn_serial_worker, BridgeConfig, BridgeResult, SerialTransport, SerialWorker,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(cli: &Cli) -> BridgeResult<()> {
    let config: BridgeConfig = cli.resolve_config()?;
    rfplayer_metrics::describe_metrics();

    // Without the device there is nothing to serve.
    let transport = SerialTransport::open(&config.serial)?;
    let mut worker = SerialWorker::new(transport);
    worker.initialize()?;

    let (serial, worker_thread) = spawn_serial_worker(worker)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(serve(&config.http, serial, shutdown_signal()));

    // Dropping the runtime drops the last handles, letting the worker exit.
    drop(runtime);
    worker_thread.finish()?;
    info!("stopped");
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
