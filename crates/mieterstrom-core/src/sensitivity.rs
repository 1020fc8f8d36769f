use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::project::{run_project, ProjectInputs, ProjectMetrics};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::MieterstromResult;

// ---------------------------------------------------------------------------
// Levers
// ---------------------------------------------------------------------------

/// A perturbable scalar field of [`ProjectInputs`].
///
/// Replaces dynamic field-name dispatch: the set of valid levers is closed
/// and type-checked, and an unknown lever name fails at deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lever {
    PvCapex,
    MeterUpgradeCapex,
    LoanAmount,
    PvYieldKwh,
    ParticipationRate,
    BaselineSalesRevenue,
    SoftwareLicenceOpex,
    RoofLeaseOpex,
    OtherOpex,
    OAndMPctOfPvCapex,
    DeltaCtPerKwh,
    BaseFeePerCustomerMonth,
    ExportShareOfYield,
    ExportPriceCtPerKwh,
    LoanInterest,
    DiscountRate,
}

impl Lever {
    /// Read the lever's current value from a parameter set.
    pub fn get(&self, inputs: &ProjectInputs) -> Decimal {
        match self {
            Lever::PvCapex => inputs.pv_capex,
            Lever::MeterUpgradeCapex => inputs.meter_upgrade_capex,
            Lever::LoanAmount => inputs.loan_amount,
            Lever::PvYieldKwh => inputs.pv_yield_kwh,
            Lever::ParticipationRate => inputs.participation_rate,
            Lever::BaselineSalesRevenue => inputs.baseline_sales_revenue,
            Lever::SoftwareLicenceOpex => inputs.software_licence_opex,
            Lever::RoofLeaseOpex => inputs.roof_lease_opex,
            Lever::OtherOpex => inputs.other_opex,
            Lever::OAndMPctOfPvCapex => inputs.o_and_m_pct_of_pv_capex,
            Lever::DeltaCtPerKwh => inputs.delta_ct_per_kwh,
            Lever::BaseFeePerCustomerMonth => inputs.base_fee_per_customer_month,
            Lever::ExportShareOfYield => inputs.export_share_of_yield,
            Lever::ExportPriceCtPerKwh => inputs.export_price_ct_per_kwh,
            Lever::LoanInterest => inputs.loan_interest,
            Lever::DiscountRate => inputs.discount_rate,
        }
    }

    /// Return a copy of the parameter set with this lever set to `value`.
    pub fn with_value(&self, inputs: &ProjectInputs, value: Decimal) -> ProjectInputs {
        let mut out = inputs.clone();
        match self {
            Lever::PvCapex => out.pv_capex = value,
            Lever::MeterUpgradeCapex => out.meter_upgrade_capex = value,
            Lever::LoanAmount => out.loan_amount = value,
            Lever::PvYieldKwh => out.pv_yield_kwh = value,
            Lever::ParticipationRate => out.participation_rate = value,
            Lever::BaselineSalesRevenue => out.baseline_sales_revenue = value,
            Lever::SoftwareLicenceOpex => out.software_licence_opex = value,
            Lever::RoofLeaseOpex => out.roof_lease_opex = value,
            Lever::OtherOpex => out.other_opex = value,
            Lever::OAndMPctOfPvCapex => out.o_and_m_pct_of_pv_capex = value,
            Lever::DeltaCtPerKwh => out.delta_ct_per_kwh = value,
            Lever::BaseFeePerCustomerMonth => out.base_fee_per_customer_month = value,
            Lever::ExportShareOfYield => out.export_share_of_yield = value,
            Lever::ExportPriceCtPerKwh => out.export_price_ct_per_kwh = value,
            Lever::LoanInterest => out.loan_interest = value,
            Lever::DiscountRate => out.discount_rate = value,
        }
        out
    }

    /// Field name as it appears on [`ProjectInputs`].
    pub fn name(&self) -> &'static str {
        match self {
            Lever::PvCapex => "pv_capex",
            Lever::MeterUpgradeCapex => "meter_upgrade_capex",
            Lever::LoanAmount => "loan_amount",
            Lever::PvYieldKwh => "pv_yield_kwh",
            Lever::ParticipationRate => "participation_rate",
            Lever::BaselineSalesRevenue => "baseline_sales_revenue",
            Lever::SoftwareLicenceOpex => "software_licence_opex",
            Lever::RoofLeaseOpex => "roof_lease_opex",
            Lever::OtherOpex => "other_opex",
            Lever::OAndMPctOfPvCapex => "o_and_m_pct_of_pv_capex",
            Lever::DeltaCtPerKwh => "delta_ct_per_kwh",
            Lever::BaseFeePerCustomerMonth => "base_fee_per_customer_month",
            Lever::ExportShareOfYield => "export_share_of_yield",
            Lever::ExportPriceCtPerKwh => "export_price_ct_per_kwh",
            Lever::LoanInterest => "loan_interest",
            Lever::DiscountRate => "discount_rate",
        }
    }
}

/// Low/high bounds for one lever in a one-way sensitivity run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeverBounds {
    pub lever: Lever,
    pub low: Decimal,
    pub high: Decimal,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One row of the one-way sensitivity table.
///
/// IRR deltas are `None` whenever either side of the difference is
/// undefined; they are never coerced to a number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub lever: String,
    pub base_value: Decimal,
    pub low: Decimal,
    pub high: Decimal,
    pub irr_base: Option<Rate>,
    pub irr_low: Option<Rate>,
    pub irr_high: Option<Rate>,
    pub npv_base: Money,
    pub npv_low: Money,
    pub npv_high: Money,
    pub irr_low_delta: Option<Rate>,
    pub irr_high_delta: Option<Rate>,
    pub npv_low_delta: Money,
    pub npv_high_delta: Money,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// One-way sensitivity over scalar fields of [`ProjectInputs`].
///
/// The base case is evaluated once; each lever is then rerun twice on a copy
/// of the base parameters with the lever at its low and high bound, all
/// other fields held at base. Rows preserve the order of `levers`. Each
/// rerun is pure and independent of the others, so callers may evaluate
/// levers concurrently if they wish.
pub fn one_way_sensitivity(
    base: &ProjectInputs,
    levers: &[LeverBounds],
) -> MieterstromResult<ComputationOutput<Vec<SensitivityRow>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let base_metrics = run_project(base)?.result.metrics;

    let mut rows = Vec::with_capacity(levers.len());
    for bounds in levers {
        let m_low = rerun_with(base, bounds.lever, bounds.low)?;
        let m_high = rerun_with(base, bounds.lever, bounds.high)?;

        if m_low.irr_equity.is_none() || m_high.irr_equity.is_none() {
            warnings.push(format!(
                "IRR undefined at a bound of lever '{}'",
                bounds.lever.name()
            ));
        }

        rows.push(SensitivityRow {
            lever: bounds.lever.name().to_string(),
            base_value: bounds.lever.get(base),
            low: bounds.low,
            high: bounds.high,
            irr_base: base_metrics.irr_equity,
            irr_low: m_low.irr_equity,
            irr_high: m_high.irr_equity,
            npv_base: base_metrics.npv_equity,
            npv_low: m_low.npv_equity,
            npv_high: m_high.npv_equity,
            irr_low_delta: irr_delta(m_low.irr_equity, base_metrics.irr_equity),
            irr_high_delta: irr_delta(m_high.irr_equity, base_metrics.irr_equity),
            npv_low_delta: m_low.npv_equity - base_metrics.npv_equity,
            npv_high_delta: m_high.npv_equity - base_metrics.npv_equity,
        });
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-way sensitivity: per-lever low/high rerun against base case",
        &serde_json::json!({
            "levers": levers.iter().map(|b| b.lever.name()).collect::<Vec<_>>(),
        }),
        warnings,
        elapsed,
        rows,
    ))
}

fn rerun_with(
    base: &ProjectInputs,
    lever: Lever,
    value: Decimal,
) -> MieterstromResult<ProjectMetrics> {
    let perturbed = lever.with_value(base, value);
    Ok(run_project(&perturbed)?.result.metrics)
}

fn irr_delta(perturbed: Option<Rate>, base: Option<Rate>) -> Option<Rate> {
    match (perturbed, base) {
        (Some(p), Some(b)) => Some(p - b),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn base_inputs() -> ProjectInputs {
        ProjectInputs {
            pv_capex: dec!(1_350_000),
            meter_upgrade_capex: dec!(150_000),
            loan_amount: dec!(1_400_000),
            pv_yield_kwh: dec!(989_010),
            customers_100pct: 120,
            participation_rate: dec!(0.85),
            baseline_sales_revenue: dec!(255_319),
            software_licence_opex: dec!(4_800),
            roof_lease_opex: dec!(6_000),
            other_opex: dec!(2_500),
            o_and_m_pct_of_pv_capex: dec!(0.012),
            delta_ct_per_kwh: dec!(0),
            base_fee_per_customer_month: dec!(8),
            export_share_of_yield: dec!(0),
            export_price_ct_per_kwh: dec!(7.5),
            loan_interest: dec!(0.042),
            loan_term_years: 25,
            grace_years: 0,
            discount_rate: dec!(0.05),
            analysis_years: 25,
        }
    }

    #[test]
    fn test_lever_roundtrip() {
        let inputs = base_inputs();
        let changed = Lever::LoanInterest.with_value(&inputs, dec!(0.06));
        assert_eq!(Lever::LoanInterest.get(&changed), dec!(0.06));
        // All other fields untouched
        assert_eq!(changed.pv_capex, inputs.pv_capex);
        assert_eq!(changed.discount_rate, inputs.discount_rate);
        // Base untouched (copy-with-replacement, no mutation)
        assert_eq!(Lever::LoanInterest.get(&inputs), dec!(0.042));
    }

    #[test]
    fn test_lever_names_deserialize() {
        let lever: Lever = serde_json::from_str("\"o_and_m_pct_of_pv_capex\"").unwrap();
        assert_eq!(lever, Lever::OAndMPctOfPvCapex);
        assert!(serde_json::from_str::<Lever>("\"no_such_field\"").is_err());
    }

    #[test]
    fn test_bounds_equal_to_base_give_zero_deltas() {
        let inputs = base_inputs();
        let levers = vec![LeverBounds {
            lever: Lever::DeltaCtPerKwh,
            low: inputs.delta_ct_per_kwh,
            high: inputs.delta_ct_per_kwh,
        }];
        let rows = one_way_sensitivity(&inputs, &levers).unwrap().result;
        let row = &rows[0];
        assert_eq!(row.irr_low, row.irr_base);
        assert_eq!(row.irr_high, row.irr_base);
        assert_eq!(row.npv_low_delta, dec!(0));
        assert_eq!(row.npv_high_delta, dec!(0));
        if row.irr_base.is_some() {
            assert_eq!(row.irr_low_delta, Some(dec!(0)));
            assert_eq!(row.irr_high_delta, Some(dec!(0)));
        }
    }

    #[test]
    fn test_row_order_follows_lever_order() {
        let inputs = base_inputs();
        let levers = vec![
            LeverBounds {
                lever: Lever::LoanInterest,
                low: dec!(0.03),
                high: dec!(0.06),
            },
            LeverBounds {
                lever: Lever::PvYieldKwh,
                low: dec!(900_000),
                high: dec!(1_050_000),
            },
            LeverBounds {
                lever: Lever::DeltaCtPerKwh,
                low: dec!(-2),
                high: dec!(2),
            },
        ];
        let rows = one_way_sensitivity(&inputs, &levers).unwrap().result;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].lever, "loan_interest");
        assert_eq!(rows[1].lever, "pv_yield_kwh");
        assert_eq!(rows[2].lever, "delta_ct_per_kwh");
    }

    #[test]
    fn test_price_lever_moves_npv_in_expected_direction() {
        let inputs = base_inputs();
        let levers = vec![LeverBounds {
            lever: Lever::DeltaCtPerKwh,
            low: dec!(-2),
            high: dec!(2),
        }];
        let rows = one_way_sensitivity(&inputs, &levers).unwrap().result;
        let row = &rows[0];
        assert!(row.npv_low < row.npv_base);
        assert!(row.npv_high > row.npv_base);
        assert!(row.npv_low_delta < dec!(0));
        assert!(row.npv_high_delta > dec!(0));
    }

    #[test]
    fn test_base_parameters_never_mutated() {
        let inputs = base_inputs();
        let levers = vec![LeverBounds {
            lever: Lever::LoanAmount,
            low: dec!(1_000_000),
            high: dec!(1_800_000),
        }];
        let _ = one_way_sensitivity(&inputs, &levers).unwrap();
        assert_eq!(inputs.loan_amount, dec!(1_400_000));
    }
}
