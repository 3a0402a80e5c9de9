//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, Paths};
use crate::output::OutputFormat;

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber installed by an embedding test harness stays in place
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Load configuration
    let paths = Paths::resolve(cli.home.as_deref())?;
    let config = Config::load(&paths.config_file())?;

    // Determine output format
    let output_format = cli
        .output
        .or(config.output_format)
        .unwrap_or(OutputFormat::Pretty);

    // Create context for commands
    let ctx = commands::Context {
        output_format,
        explain: cli.explain || config.explain_by_default,
        verbose: cli.verbose,
        no_color: cli.no_color,
        yes: cli.yes,
        paths,
        config,
    };

    // Dispatch to appropriate command
    match cli.command {
        Commands::Servers(args) => commands::servers::execute(ctx, args).await,
        Commands::Rules(args) => commands::rules::execute(ctx, args).await,
        Commands::Probe(args) => commands::probe::execute(ctx, args).await,
        Commands::Bootstrap { key } => commands::bootstrap::execute(ctx, &key).await,
        Commands::Logs(args) => commands::logs::execute(ctx, args).await,
        Commands::Ips(args) => commands::ips::execute(ctx, args).await,
        Commands::Config(args) => commands::config::execute(ctx, args).await,
    }
}
