//! This file defines the bellybutton binary entry point.

use bellybutton::app;
use bellybutton::app_state::AppState;
use bellybutton::cli;
use bellybutton::metrics;
use bellybutton::server;
use bellybutton::tracing;

use std::process::exit;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing(&args);
    ::tracing::debug!(?args, "parsed command line");
    if let Err(err) = metrics::register_metrics() {
        ::tracing::error!("failed to register metrics: {}", err);
        exit(1)
    }
    let state = match AppState::open(&args).await {
        Ok(state) => state,
        Err(err) => {
            ::tracing::error!(database = %args.database, error = ?err, "failed to open database");
            exit(1)
        }
    };
    let service = app::service(state);
    if let Err(err) = server::serve(&args, service).await {
        ::tracing::error!("server error: {}", err);
        tracing::shutdown_tracing();
        exit(1)
    }
    tracing::shutdown_tracing();
}
