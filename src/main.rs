use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use wgtunnel::cli::{commands, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(e) = commands::cmd_run(cli.config, cli.args).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
