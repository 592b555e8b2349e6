//! Sleuth CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sleuth::cli::{Cli, Commands};
use sleuth::infrastructure::ConfigLoader;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            sleuth::cli::handle_error(err, cli.json);
            return;
        }
    };

    init_tracing(&config.logging.level, &config.logging.format);

    let result = match cli.command {
        Commands::Workflow(args) => {
            sleuth::cli::commands::workflow::execute(args, config, cli.json).await
        }
        Commands::Triage(args) => {
            sleuth::cli::commands::triage::execute(args, config, cli.json).await
        }
    };

    if let Err(err) = result {
        sleuth::cli::handle_error(err, cli.json);
    }
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
