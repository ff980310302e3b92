//! This file defines the seq2view binary entry point.

use seq2view::app;
use seq2view::cli;
use seq2view::metrics;
use seq2view::server;
use seq2view::tracing;

use std::process::exit;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = tracing::init_tracing(&args) {
        eprintln!("failed to initialise tracing: {err}");
        exit(1)
    }
    ::tracing::debug!(?args, "parsed arguments");
    if let Err(err) = metrics::register_metrics() {
        ::tracing::error!("failed to register metrics: {err}");
        exit(1)
    }
    let service = match app::service(&args) {
        Ok(service) => service,
        Err(err) => {
            ::tracing::error!("failed to start: {err}");
            exit(1)
        }
    };
    let result = server::serve(&args, service).await;
    tracing::shutdown_tracing();
    if let Err(err) = result {
        eprintln!("{err}");
        exit(1)
    }
}
