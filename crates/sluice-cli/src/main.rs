use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "sluice", version, about = "Sluice routing rule tools")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a rule file and list its rules in firing order.
    Check {
        /// Multi-document YAML rule file
        rules: PathBuf,
    },

    /// Run one request through the configured selector and show the facts and decision.
    Route(commands::route::RouteArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Check { rules } => commands::check::run(&rules).await,
        Command::Route(args) => commands::route::run(args).await,
    }
}
