use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use mieterstrom_core::project::ProjectInputs;
use mieterstrom_core::sensitivity::{one_way_sensitivity, LeverBounds};

use crate::input;

/// Arguments for one-way sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON input file: { "base": <project inputs>, "levers": [...] }
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Deserialize)]
struct SensitivityRequest {
    base: ProjectInputs,
    levers: Vec<LeverBounds>,
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: SensitivityRequest = input::load_payload(args.input.as_deref())?
        .ok_or("--input <file.json> or piped stdin required for sensitivity analysis")?;

    let result = one_way_sensitivity(&request.base, &request.levers)?;
    Ok(serde_json::to_value(result)?)
}
