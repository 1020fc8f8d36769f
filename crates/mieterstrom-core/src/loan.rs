use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MieterstromError;
use crate::types::{Money, Rate};
use crate::MieterstromResult;

const RATE_EPSILON: Decimal = dec!(0.000000000001);

/// Yearly amortizing loan with optional interest-only grace years.
///
/// During grace years the payment equals interest and no principal is
/// repaid; afterwards payments are a constant annuity over the remaining
/// years.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSpec {
    pub principal: Money,
    /// Annual interest rate as a decimal (0.045 = 4.5%)
    pub annual_interest: Rate,
    pub term_years: u32,
    #[serde(default)]
    pub grace_years: u32,
}

/// One year of the amortization schedule (years 1..=term)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub balance_start: Money,
    pub interest: Money,
    pub principal_paid: Money,
    pub payment: Money,
    pub balance_end: Money,
}

/// Full amortization schedule for a loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub years: Vec<AmortizationYear>,
    /// Constant post-grace payment (zero when grace covers the full term)
    pub annuity: Money,
    pub total_interest_paid: Money,
    pub total_principal_paid: Money,
}

/// Build the yearly amortization schedule for a loan.
///
/// Grace years beyond the term are silently clamped. The post-grace annuity
/// is sized against the original principal over `term - grace` years; since
/// no principal is repaid during grace, this equals the balance remaining at
/// grace end. Balances are floored at zero and never increase.
pub fn amortize(spec: &LoanSpec) -> MieterstromResult<AmortizationSchedule> {
    if spec.term_years == 0 {
        return Err(MieterstromError::InvalidInput {
            field: "term_years".into(),
            reason: "Loan term must be at least 1 year".into(),
        });
    }
    if spec.principal < Decimal::ZERO {
        return Err(MieterstromError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must not be negative".into(),
        });
    }

    let rate = spec.annual_interest;
    let term = spec.term_years;
    let grace = spec.grace_years.min(term);

    let remaining_years = term - grace;
    let annuity = if remaining_years > 0 {
        annuity_payment(spec.principal, rate, remaining_years)
    } else {
        Decimal::ZERO
    };

    let mut years = Vec::with_capacity(term as usize);
    let mut balance = spec.principal;
    let mut total_interest_paid = Decimal::ZERO;
    let mut total_principal_paid = Decimal::ZERO;

    for year in 1..=term {
        let balance_start = balance;
        let interest = balance_start * rate;

        let (payment, principal_paid) = if year <= grace {
            (interest, Decimal::ZERO)
        } else {
            (annuity, (annuity - interest).max(Decimal::ZERO))
        };

        let balance_end = (balance_start - principal_paid).max(Decimal::ZERO);

        total_interest_paid += interest;
        total_principal_paid += principal_paid;

        years.push(AmortizationYear {
            year,
            balance_start,
            interest,
            principal_paid,
            payment,
            balance_end,
        });

        balance = balance_end;
    }

    Ok(AmortizationSchedule {
        years,
        annuity,
        total_interest_paid,
        total_principal_paid,
    })
}

/// Constant annual payment amortizing `principal` over `years` at `rate`.
/// Straight-line when the rate is effectively zero.
fn annuity_payment(principal: Money, rate: Rate, years: u32) -> Money {
    if rate.abs() < RATE_EPSILON {
        return principal / Decimal::from(years);
    }
    let factor = (Decimal::ONE + rate).powd(Decimal::from(years));
    principal * rate * factor / (factor - Decimal::ONE)
}
