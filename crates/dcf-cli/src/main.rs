mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::edgar::EdgarArgs;
use commands::resolve::ResolveArgs;
use commands::valuation::{ValueArgs, WaccArgs};

/// Filing-fact resolution and two-stage DCF valuation
#[derive(Parser)]
#[command(
    name = "dcf",
    version,
    about = "Resolve filing facts and run two-stage DCF valuations",
    long_about = "Turns period-tagged financial statement facts into valuation inputs \
                  and values the company with a two-stage free-cash-flow DCF, \
                  using decimal precision throughout."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve statement facts into a valuation input bundle
    Resolve(ResolveArgs),
    /// Run the two-stage DCF valuation
    Value(ValueArgs),
    /// Calculate WACC from the bundle's capital structure
    Wacc(WaccArgs),
    /// Flatten an SEC companyfacts document into statement facts
    Edgar(EdgarArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: u8) -> Result<(), Box<dyn std::error::Error>> {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(level),
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("{}: failed to initialise logging: {}", "warning".yellow().bold(), e);
    }

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Resolve(args) => commands::resolve::run_resolve(args),
        Commands::Value(args) => commands::valuation::run_value(args),
        Commands::Wacc(args) => commands::valuation::run_wacc(args),
        Commands::Edgar(args) => commands::edgar::run_edgar(args),
        Commands::Version => {
            println!("dcf {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
