use clap::Args;
use serde_json::Value;

use mieterstrom_core::project::{self, ProjectInputs};

use crate::input;

/// Arguments for the project cash-flow model
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON input file with the project parameters
    #[arg(long)]
    pub input: Option<String>,

    /// Emit only the yearly cash-flow rows (for tabular/CSV export)
    #[arg(long)]
    pub table: bool,
}

pub fn run_project_model(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: ProjectInputs = input::load_payload(args.input.as_deref())?
        .ok_or("--input <file.json> or piped stdin required for the project model")?;

    let result = project::run_project(&inputs)?;
    if args.table {
        Ok(serde_json::to_value(&result.result.cashflows)?)
    } else {
        Ok(serde_json::to_value(result)?)
    }
}
