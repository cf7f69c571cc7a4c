use std::env;
use std::time::Duration;

use ::tracing::{info, warn};
use clap::Parser;
use miette::Result;

mod cli;
mod error;
mod http;
mod page;
mod rewrite;
mod scan;
#[cfg(test)]
mod test_support;
mod tracing;

pub use error::Error;

/// How long in-flight requests may take to finish once shutdown starts
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Override RUST_LOG with a default setting if it's not set by the user
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "a11y_frontend=debug,tower_http=debug");
    }

    let opts = cli::Opts::parse();
    tracing::init(&opts.tracing_opts)?;

    let version = env!("CARGO_PKG_VERSION");
    info!(version, backend_url = %opts.backend_url, "Starting a11y-frontend");

    let handle = axum_server::Handle::new();
    tokio::spawn(shutdown_on_ctrl_c(handle.clone()));

    info!("starting http server");
    http::start_server(&opts, handle).await?;
    info!("http server stopped");

    Ok(())
}

async fn shutdown_on_ctrl_c(handle: axum_server::Handle) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for shutdown signal");
        return;
    }

    info!("shutting down");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
