pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "spectrum",
    about = "Shopper Spectrum operator CLI",
    long_about = "Predict customer segments, recommend similar products, and inspect model readiness.",
    after_help = "Examples:\n  spectrum predict --recency 12 --frequency 8 --monetary 640\n  spectrum recommend \"white metal lantern\" --top-n 3\n  spectrum doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Predict the customer segment for an RFM profile")]
    Predict {
        #[arg(long, default_value_t = 30.0, help = "Days since the last purchase")]
        recency: f64,
        #[arg(long, default_value_t = 5.0, help = "Number of purchases")]
        frequency: f64,
        #[arg(long, default_value_t = 100.0, help = "Total spend")]
        monetary: f64,
    },
    #[command(about = "Recommend products similar to a catalog product")]
    Recommend {
        #[arg(help = "Product name (case-insensitive) or product id with --id")]
        product: String,
        #[arg(long, help = "Treat the argument as a product id instead of a name")]
        id: bool,
        #[arg(long = "top-n", help = "Number of recommendations (default from config)")]
        top_n: Option<usize>,
    },
    #[command(about = "List catalog product names available for recommendation")]
    Products {
        #[arg(long, help = "Case-insensitive substring filter")]
        search: Option<String>,
    },
    #[command(about = "Validate config and model artifact readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Write a small self-consistent demo model bundle")]
    Seed {
        #[arg(long, default_value = "models", help = "Target directory for the bundle")]
        dir: PathBuf,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Predict { recency, frequency, monetary } => {
            commands::predict::run(recency, frequency, monetary)
        }
        Command::Recommend { product, id, top_n } => commands::recommend::run(&product, id, top_n),
        Command::Products { search } => commands::products::run(search.as_deref()),
        Command::Doctor { json } => {
            let (exit_code, output) = commands::doctor::run(json);
            commands::CommandResult { exit_code, output }
        }
        Command::Config => commands::config::run(),
        Command::Seed { dir } => commands::seed::run(&dir),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
