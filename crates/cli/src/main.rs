mod commands;

use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use majorka_import::{read_config, ImportConfig};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Majorka reporting importer.
#[derive(Parser)]
#[command(
    name = "majorka-import",
    version,
    about = "Import Majorka event bus records into the reporting store"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true, env = "MAJORKA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import new records for each configured entity kind
    Run {
        /// Entity kind to import (repeatable). Default: the configured list
        #[arg(long = "entity")]
        entities: Vec<String>,
        /// Records per kind in this pass; 0 means unlimited
        #[arg(long)]
        batch_limit: Option<u64>,
    },

    /// Check that the store and the bus are reachable
    Check,

    /// Print the effective configuration
    Config,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env = std::env::var("RUST_LOG").unwrap_or_else(|_| default.to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>, output: OutputFormat, quiet: bool) -> ImportConfig {
    let mut config = match path {
        Some(path) => match read_config(path) {
            Ok(config) => config,
            Err(e) => {
                report_error(&e.to_string(), output, quiet);
                process::exit(1);
            }
        },
        None => ImportConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok());
    config
}

fn main() {
    let cli = Cli::parse();
    if !cli.quiet {
        init_tracing(cli.verbose);
    }
    let config = load_config(cli.config.as_ref(), cli.output, cli.quiet);

    match cli.command {
        Commands::Run {
            entities,
            batch_limit,
        } => {
            commands::cmd_run(&config, &entities, batch_limit, cli.output, cli.quiet);
        }
        Commands::Check => {
            commands::cmd_check(&config, cli.output, cli.quiet);
        }
        Commands::Config => {
            commands::cmd_config(&config, cli.output);
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
