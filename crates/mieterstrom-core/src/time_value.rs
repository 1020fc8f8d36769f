use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::MieterstromError;
use crate::types::{Money, Rate};
use crate::MieterstromResult;

const IRR_INITIAL_GUESS: Decimal = dec!(0.08);
const IRR_STEP_TOLERANCE: Decimal = dec!(0.0000000001);
const IRR_DERIVATIVE_FLOOR: Decimal = dec!(0.000000000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// Net Present Value of a series of cash flows, cash_flows[0] at t=0.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> MieterstromResult<Money> {
    if rate <= dec!(-1) {
        return Err(MieterstromError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        if discount.is_zero() {
            return Err(MieterstromError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Internal Rate of Return using Newton-Raphson from an 8% starting guess.
///
/// Returns `None` when no real IRR can be found: fewer than two cash flows,
/// a stalled derivative, or no convergence within the iteration cap. Callers
/// must treat `None` as a normal, displayable outcome rather than a failure.
pub fn irr(cash_flows: &[Money]) -> Option<Rate> {
    if cash_flows.len() < 2 {
        return None;
    }

    let mut rate = IRR_INITIAL_GUESS;

    for _ in 0..MAX_IRR_ITERATIONS {
        let mut f = Decimal::ZERO;
        let mut df = Decimal::ZERO;
        let one_plus_r = Decimal::ONE + rate;

        for (t, cf) in cash_flows.iter().enumerate() {
            let t_dec = Decimal::from(t as i64);
            // Overflowed or vanished discount factors contribute nothing
            let discount = match one_plus_r.checked_powd(t_dec) {
                Some(d) if !d.is_zero() => d,
                _ => continue,
            };
            f += cf / discount;
            if t > 0 {
                if let Some(d_next) = one_plus_r.checked_powd(t_dec + Decimal::ONE) {
                    if !d_next.is_zero() {
                        df -= t_dec * cf / d_next;
                    }
                }
            }
        }

        if df.abs() < IRR_DERIVATIVE_FLOOR {
            return None;
        }

        let step = f / df;
        rate -= step;

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(100.0) {
            rate = dec!(100.0);
        }

        if step.abs() < IRR_STEP_TOLERANCE {
            return Some(rate);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_at_or_below_minus_one() {
        let cfs = vec![dec!(-100), dec!(50)];
        assert!(npv(dec!(-1), &cfs).is_err());
        assert!(npv(dec!(-1.5), &cfs).is_err());
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs).unwrap();
        // IRR should be ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_zeroes_npv() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let r = irr(&cfs).unwrap();
        let residual = npv(r, &cfs).unwrap();
        assert!(residual.abs() < dec!(0.000001));
    }

    #[test]
    fn test_irr_degenerate_sequences() {
        // Too short
        assert!(irr(&[dec!(-100)]).is_none());
        // All zero: derivative stalls immediately
        assert!(irr(&[dec!(0), dec!(0), dec!(0)]).is_none());
        // All same sign: NPV never crosses zero
        assert!(irr(&[dec!(100), dec!(100), dec!(100)]).is_none());
    }

    #[test]
    fn test_npv_monotonic_in_rate() {
        // Single outflow at t=0, positive inflows after: NPV strictly
        // decreasing in the discount rate.
        let cfs = vec![dec!(-1000), dec!(300), dec!(300), dec!(300), dec!(300)];
        let rates = [dec!(0.00), dec!(0.02), dec!(0.05), dec!(0.10), dec!(0.20)];
        let mut prev = npv(rates[0], &cfs).unwrap();
        for r in &rates[1..] {
            let v = npv(*r, &cfs).unwrap();
            assert!(v < prev, "NPV not decreasing at rate {r}");
            prev = v;
        }
    }
}
