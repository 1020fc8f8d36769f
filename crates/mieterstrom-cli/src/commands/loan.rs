use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use mieterstrom_core::loan::{amortize, LoanSpec};

use crate::input;

/// Arguments for the amortization schedule
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AmortizeArgs {
    /// Path to JSON input file with a loan spec (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate (e.g. 0.042 for 4.2%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub term: Option<u32>,

    /// Interest-only grace years
    #[arg(long, default_value_t = 0)]
    pub grace: u32,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let spec: LoanSpec = match input::load_payload(args.input.as_deref())? {
        Some(spec) => spec,
        None => {
            let principal = args
                .principal
                .ok_or("--principal is required (or provide --input)")?;
            let rate = args.rate.ok_or("--rate is required (or provide --input)")?;
            let term = args.term.ok_or("--term is required (or provide --input)")?;
            LoanSpec {
                principal,
                annual_interest: rate,
                term_years: term,
                grace_years: args.grace,
            }
        }
    };

    let schedule = amortize(&spec)?;
    Ok(serde_json::to_value(schedule)?)
}
