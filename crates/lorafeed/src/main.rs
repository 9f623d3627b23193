//! `lorafeed` — headless LoRa field gateway.
//!
//! Loads the persisted configuration (writing a template on first run),
//! connects to the radio daemon, and forwards every decoded frame to the
//! feed service until ctrl-c or SIGTERM.

mod cli;
mod error;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use lorafeed_core::{CloudSink, Gateway, UdpRadio};

use crate::cli::Cli;
use crate::error::AppError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let guard = init_tracing(cli.verbose, cli.log_file.as_deref());

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        error!(error = %err, code, "gateway stopped on a fatal error");
        // process::exit skips destructors; flush the file writer first.
        drop(guard);
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("lorafeed.log"));
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    guard
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let path = cli.config.unwrap_or_else(lorafeed_config::config_path);

    // Nothing touches the radio or the cloud until this succeeds.
    let settings =
        lorafeed_config::load(&path).map_err(|e| AppError::from_config(e, &path))?;
    settings.log_summary(&path);

    let config = Arc::new(settings.gateway);
    let sink = CloudSink::new(&config)?;
    let radio = UdpRadio::bind(&settings.radio_bridge).await?;
    let mut handle = Gateway::start(config, radio, sink).await?;
    info!("gateway running; press ctrl-c to stop");

    tokio::select! {
        result = shutdown_signal() => {
            result.map_err(AppError::Signal)?;
            info!("shutdown requested");
        }
        () = handle.wait() => warn!("radio event stream ended"),
    }

    let stats = handle.shutdown().await;
    info!(
        frames_received = stats.frames_received,
        frames_rejected = stats.total_rejected(),
        batches_forwarded = stats.batches_forwarded,
        forwards_failed = stats.forwards_failed,
        forwards_cancelled = stats.forwards_cancelled,
        "gateway stopped"
    );
    Ok(())
}

/// Resolves on ctrl-c, or SIGTERM on unix.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = term.recv() => Ok(()),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
