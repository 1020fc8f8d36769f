use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::loan::{amortize, LoanSpec};
use crate::time_value::{irr, npv};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::MieterstromResult;

/// Debt service below this threshold is treated as "no debt" for DSCR
const DEBT_SERVICE_FLOOR: Decimal = dec!(0.000000001);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Full parameter set for a single Mieterstrom project run.
///
/// Rates are decimals (0.045 = 4.5%), energy prices in ct/kWh, monetary
/// values in EUR, energy in kWh per year. Immutable per run; the sensitivity
/// engine works on copies with one field replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInputs {
    // Investment
    /// PV plant capex
    pub pv_capex: Money,
    /// Metering infrastructure upgrade capex
    pub meter_upgrade_capex: Money,
    /// Loan principal drawn against the project
    pub loan_amount: Money,

    // PV and customers
    /// Annual PV yield (kWh/a)
    pub pv_yield_kwh: Decimal,
    /// Tenant units at 100% participation
    pub customers_100pct: u32,
    /// Share of tenants participating (0..1, clamped)
    pub participation_rate: Rate,

    // Baseline revenue
    /// Annual tenant electricity sales revenue at current assumptions (EUR/a)
    pub baseline_sales_revenue: Money,

    // Opex
    pub software_licence_opex: Money,
    pub roof_lease_opex: Money,
    pub other_opex: Money,
    /// O&M as a fraction of PV capex per year (e.g. 0.012)
    pub o_and_m_pct_of_pv_capex: Rate,

    // Price levers
    /// Tenant price change vs the derived baseline (ct/kWh)
    pub delta_ct_per_kwh: Decimal,
    /// Monthly base fee per participating customer (EUR)
    pub base_fee_per_customer_month: Money,

    // Grid export
    /// Share of PV yield exported instead of sold to tenants (0..1, clamped)
    pub export_share_of_yield: Rate,
    pub export_price_ct_per_kwh: Decimal,

    // Financing
    pub loan_interest: Rate,
    pub loan_term_years: u32,
    pub grace_years: u32,
    /// Discount rate for the equity NPV
    pub discount_rate: Rate,
    /// Projection horizon in years
    #[serde(default = "default_analysis_years")]
    pub analysis_years: u32,
}

fn default_analysis_years() -> u32 {
    25
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One row of the yearly cash-flow table (year 0 = equity outflow only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashflowYear {
    pub year: u32,
    pub revenue: Money,
    pub tenant_energy_revenue: Money,
    pub base_fees: Money,
    pub export_revenue: Money,
    pub opex: Money,
    pub ebitda: Money,
    pub debt_payment: Money,
    pub debt_interest: Money,
    pub debt_principal: Money,
    pub free_cashflow_to_equity: Money,
}

/// Summary metrics for a project run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetrics {
    pub capex_total: Money,
    /// capex_total - loan_amount; negative when the project is over-financed
    pub equity: Money,
    /// Break-even tenant price implied by baseline revenue and sold volume
    pub baseline_price_ct_per_kwh: Decimal,
    /// Lever-adjusted tenant price, floored at zero
    pub price_ct_per_kwh: Decimal,
    pub customers: u32,
    pub sold_kwh: Decimal,
    pub export_kwh: Decimal,
    pub annual_revenue: Money,
    pub annual_opex: Money,
    pub annual_ebitda: Money,
    /// Equity IRR over years 0..=analysis_years; None when not computable
    pub irr_equity: Option<Rate>,
    pub npv_equity: Money,
    /// Minimum EBITDA / debt service over years with debt; None without debt
    pub dscr_min: Option<Decimal>,
}

/// Result of a full project run: yearly table plus summary metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRun {
    pub metrics: ProjectMetrics,
    pub cashflows: Vec<CashflowYear>,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Break-even tenant price in ct/kWh implied by the baseline sales revenue
/// and the volume actually sold to tenants. Zero when no volume is sold.
pub fn baseline_price_ct_per_kwh(
    pv_yield_kwh: Decimal,
    baseline_sales_revenue: Money,
    export_share: Rate,
) -> Decimal {
    let sold_kwh = pv_yield_kwh * (Decimal::ONE - clamp_unit(export_share));
    if sold_kwh <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    baseline_sales_revenue / sold_kwh * dec!(100)
}

/// Run the full project cash-flow model: derive volumes, revenues, opex,
/// integrate the loan schedule, and produce the yearly table plus metrics.
///
/// Pure and deterministic. Out-of-range economic inputs (zero yield, zero
/// customers, negative equity) degrade to zero/undefined metrics rather
/// than failing.
pub fn run_project(inputs: &ProjectInputs) -> MieterstromResult<ComputationOutput<ProjectRun>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // 1. Capital structure
    let capex_total = inputs.pv_capex + inputs.meter_upgrade_capex;
    let equity = capex_total - inputs.loan_amount;
    if equity < Decimal::ZERO {
        warnings.push("Loan exceeds total capex; year-0 equity cash flow is positive".into());
    }

    // 2. Participation
    let participation = clamp_unit(inputs.participation_rate);
    let customers = (Decimal::from(inputs.customers_100pct) * participation)
        .round()
        .to_u32()
        .unwrap_or(0);

    // 3. Yield split
    let export_share = clamp_unit(inputs.export_share_of_yield);
    let sold_share = Decimal::ONE - export_share;

    // 4./5. Tenant price
    let baseline_price = baseline_price_ct_per_kwh(
        inputs.pv_yield_kwh,
        inputs.baseline_sales_revenue,
        export_share,
    );
    let price_ct = (baseline_price + inputs.delta_ct_per_kwh).max(Decimal::ZERO);

    // 6. Energy volumes
    let sold_kwh = inputs.pv_yield_kwh * sold_share;
    let export_kwh = inputs.pv_yield_kwh * export_share;

    // 7. Revenues
    let tenant_energy_revenue = sold_kwh * price_ct / dec!(100);
    let base_fees = Decimal::from(customers) * inputs.base_fee_per_customer_month * dec!(12);
    let export_revenue = export_kwh * inputs.export_price_ct_per_kwh / dec!(100);
    let annual_revenue = tenant_energy_revenue + base_fees + export_revenue;

    // 8. Opex
    let o_and_m = inputs.pv_capex * inputs.o_and_m_pct_of_pv_capex;
    let annual_opex =
        inputs.software_licence_opex + inputs.roof_lease_opex + inputs.other_opex + o_and_m;
    let annual_ebitda = annual_revenue - annual_opex;

    // 9. Loan schedule, truncated/zero-padded to the analysis horizon
    let schedule = amortize(&LoanSpec {
        principal: inputs.loan_amount,
        annual_interest: inputs.loan_interest,
        term_years: inputs.loan_term_years,
        grace_years: inputs.grace_years,
    })?;

    // 10. Yearly table; year 0 carries only the equity outflow
    let years = inputs.analysis_years;
    let mut cashflows: Vec<CashflowYear> = Vec::with_capacity(years as usize + 1);
    cashflows.push(CashflowYear {
        year: 0,
        revenue: Decimal::ZERO,
        tenant_energy_revenue: Decimal::ZERO,
        base_fees: Decimal::ZERO,
        export_revenue: Decimal::ZERO,
        opex: Decimal::ZERO,
        ebitda: Decimal::ZERO,
        debt_payment: Decimal::ZERO,
        debt_interest: Decimal::ZERO,
        debt_principal: Decimal::ZERO,
        free_cashflow_to_equity: -equity,
    });

    for y in 1..=years {
        let debt_row = schedule.years.get(y as usize - 1);
        let debt_payment = debt_row.map_or(Decimal::ZERO, |r| r.payment);
        let debt_interest = debt_row.map_or(Decimal::ZERO, |r| r.interest);
        let debt_principal = debt_row.map_or(Decimal::ZERO, |r| r.principal_paid);

        cashflows.push(CashflowYear {
            year: y,
            revenue: annual_revenue,
            tenant_energy_revenue,
            base_fees,
            export_revenue,
            opex: annual_opex,
            ebitda: annual_ebitda,
            debt_payment,
            debt_interest,
            debt_principal,
            free_cashflow_to_equity: annual_ebitda - debt_payment,
        });
    }

    // 11. Summary metrics over the equity cash-flow sequence
    let equity_cfs: Vec<Money> = cashflows
        .iter()
        .map(|row| row.free_cashflow_to_equity)
        .collect();

    let irr_equity = irr(&equity_cfs);
    if irr_equity.is_none() {
        warnings.push("Equity IRR is not computable for this cash-flow sequence".into());
    }
    let npv_equity = npv(inputs.discount_rate, &equity_cfs)?;

    let dscr_min = cashflows
        .iter()
        .skip(1)
        .filter(|row| row.debt_payment > DEBT_SERVICE_FLOOR)
        .map(|row| row.ebitda / row.debt_payment)
        .min();

    let metrics = ProjectMetrics {
        capex_total,
        equity,
        baseline_price_ct_per_kwh: baseline_price,
        price_ct_per_kwh: price_ct,
        customers,
        sold_kwh,
        export_kwh,
        annual_revenue,
        annual_opex,
        annual_ebitda,
        irr_equity,
        npv_equity,
        dscr_min,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Mieterstrom project cash-flow projection with equity IRR/NPV and DSCR",
        &serde_json::json!({
            "capex_total": capex_total.to_string(),
            "loan_amount": inputs.loan_amount.to_string(),
            "analysis_years": years,
        }),
        warnings,
        elapsed,
        ProjectRun { metrics, cashflows },
    ))
}

fn clamp_unit(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(Decimal::ONE)
}
