mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::loan::AmortizeArgs;
use commands::project::ProjectArgs;
use commands::sensitivity::SensitivityArgs;

/// Mieterstrom project economics
#[derive(Parser)]
#[command(
    name = "mstrom",
    version,
    about = "Mieterstrom project economics with decimal precision",
    long_about = "Computes the economics of a shared-building solar (Mieterstrom) \
                  project: loan amortization schedules, a year-by-year cash-flow \
                  projection with equity IRR/NPV and minimum DSCR, and one-way \
                  sensitivity analysis over the model's pricing and cost levers."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a yearly loan amortization schedule
    Amortize(AmortizeArgs),
    /// Run the project cash-flow model (table + metrics)
    Project(ProjectArgs),
    /// One-way sensitivity analysis over project levers
    Sensitivity(SensitivityArgs),
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

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::loan::run_amortize(args),
        Commands::Project(args) => commands::project::run_project_model(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Version => {
            println!("mstrom {}", env!("CARGO_PKG_VERSION"));
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
