//! User Service - account administration CLI.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use user_service_lib::cli::Cli;
use user_service_lib::commands;
use user_service_lib::config::UserServiceConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Load configuration (also reads .env)
    let mut config = UserServiceConfig::from_env();
    if let Some(url) = cli.database_url {
        config = config.with_database_url(url);
    }
    tracing::debug!(?config, "Configuration loaded");

    if let Err(e) = commands::execute(cli.command, config).await {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing subscriber (verbose mode sets debug level)
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
