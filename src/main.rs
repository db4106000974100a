//! Command-line entry point
//!
//! Loads configuration from the environment, runs the export, and
//! terminates with a non-zero status on any fatal error.

use notion_backup::{Config, Exporter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => die(&e),
    };

    let exporter = match Exporter::new(config) {
        Ok(exporter) => exporter,
        Err(e) => die(&e),
    };

    if let Err(e) = exporter.run().await {
        die(&e);
    }
}

/// Print a diagnostic and terminate with a non-zero status
fn die(error: &notion_backup::Error) -> ! {
    eprintln!("{error}");
    std::process::exit(1);
}
