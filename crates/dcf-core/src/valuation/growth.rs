use rust_decimal::Decimal;

use crate::types::Rate;

use super::assumptions::ProjectionPolicy;

/// Year-by-year revenue growth rates for years `1..=years`.
///
/// Starts from `initial_growth` (replaced by `risk_free_rate` when it is not
/// positive), holds it for `policy.high_growth_years`, then decays in a
/// straight line to `terminal_growth` over `policy.decay_years` (default: the
/// rest of the horizon). Every rate is floored at `terminal_growth`.
pub fn growth_schedule(
    initial_growth: Rate,
    terminal_growth: Rate,
    risk_free_rate: Rate,
    years: u32,
    policy: &ProjectionPolicy,
) -> Vec<Rate> {
    let start = if initial_growth <= Decimal::ZERO {
        risk_free_rate
    } else {
        initial_growth
    };

    let hold = policy.high_growth_years.min(years);
    let span = policy.decay_years.unwrap_or(years - hold).max(1);
    let span_dec = Decimal::from(span);

    (1..=years)
        .map(|n| {
            let rate = if n <= hold {
                start
            } else {
                let k = Decimal::from(n - hold);
                start - (start - terminal_growth) * k / span_dec
            };
            rate.max(terminal_growth)
        })
        .collect()
}
