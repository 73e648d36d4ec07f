use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::DcfError;
use crate::types::{Money, Rate};
use crate::DcfResult;

/// End-of-period discount factor: 1 / (1 + rate)^periods
pub fn discount_factor(rate: Rate, periods: u32) -> DcfResult<Rate> {
    if rate <= dec!(-1) {
        return Err(DcfError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let compounded = (Decimal::ONE + rate)
        .checked_powi(i64::from(periods))
        .ok_or_else(|| DcfError::InvalidInput {
            field: "rate".into(),
            reason: format!("(1 + {rate})^{periods} overflows"),
        })?;

    if compounded.is_zero() {
        return Err(DcfError::InvalidInput {
            field: "rate".into(),
            reason: format!("Discount factor at period {periods} is undefined"),
        });
    }

    Ok(Decimal::ONE / compounded)
}

/// Present value of a single amount received at the end of `periods`.
pub fn present_value(amount: Money, rate: Rate, periods: u32) -> DcfResult<Money> {
    amount
        .checked_mul(discount_factor(rate, periods)?)
        .ok_or_else(|| DcfError::InvalidInput {
            field: "amount".into(),
            reason: format!("Present value of {amount} at period {periods} overflows"),
        })
}

/// Gordon growth perpetuity value of a cash flow one period after `fcf`:
/// TV = fcf * (1 + g) / (rate - g)
///
/// Undefined when `rate <= g`; that case is rejected rather than returning a
/// negative or unbounded value. A spread so small the value leaves the
/// decimal range is rejected the same way.
pub fn gordon_growth_value(fcf: Money, rate: Rate, growth: Rate) -> DcfResult<Money> {
    let spread = rate - growth;
    if spread <= Decimal::ZERO {
        return Err(DcfError::InvalidAssumption {
            field: "terminal_growth_rate".into(),
            reason: format!(
                "Discount rate ({rate}) must exceed terminal growth rate ({growth}) for the Gordon growth model"
            ),
        });
    }
    fcf.checked_mul(Decimal::ONE + growth)
        .and_then(|grown| grown.checked_div(spread))
        .ok_or_else(|| DcfError::InvalidAssumption {
            field: "terminal_growth_rate".into(),
            reason: format!(
                "Terminal value of {fcf} at a spread of {spread} exceeds the decimal range"
            ),
        })
}
