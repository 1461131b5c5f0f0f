// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! barnacles - forwards raddec and dynamb telemetry into a SQLite store.
//!
//! This is the binary entry point.

mod forward;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use barnacles_config::model::BarnaclesConfig;

/// barnacles - forwards raddec and dynamb telemetry into a SQLite store.
#[derive(Parser, Debug)]
#[command(name = "barnacles", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Forward JSON-lines events from stdin (the default).
    Run,
    /// Print the resolved configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => barnacles_config::load_and_validate_path(path),
        None => barnacles_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            barnacles_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            init_tracing(&config.log_level);
            if let Err(e) = forward::run_forward(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Config => match render_config(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("error: failed to render configuration: {e}");
                std::process::exit(1);
            }
        },
    }
}

fn render_config(config: &BarnaclesConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(config)
}

/// Initialize the tracing subscriber with the configured log level.
///
/// `RUST_LOG` takes precedence when set. Output goes to stderr so stdout
/// carries only stored events.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "barnacles={log_level},barnacles_forwarder={log_level},barnacles_storage={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
