use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DcfError;
use crate::types::{Money, Rate};
use crate::DcfResult;

use super::facts::ConceptSeries;

/// Which debt balances count as debt for the equity bridge and WACC weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtBasis {
    /// Long-term debt only
    #[default]
    LongTermOnly,
    /// Long-term plus short-term borrowings
    LongAndShortTerm,
}

/// Outcome of the effective tax rate derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxRateSource {
    Computed,
    /// Computed rate was <= 0 and was raised to the floor
    Floored,
    /// No usable pretax income; configured default used
    Defaulted,
}

/// Mean period-over-period growth of a most-recent-first series:
/// mean((r[i] - r[i+1]) / r[i+1]).
pub fn yoy_growth(revenues: &[Money]) -> DcfResult<Rate> {
    if revenues.len() < 2 {
        return Err(DcfError::DataInsufficient(format!(
            "Growth rate requires at least 2 periods of revenue, got {}",
            revenues.len()
        )));
    }

    let mut total = Decimal::ZERO;
    for (i, pair) in revenues.windows(2).enumerate() {
        let (current, prior) = (pair[0], pair[1]);
        if prior.is_zero() {
            return Err(DcfError::DataInsufficient(format!(
                "Revenue for period {} is zero; growth from a zero base is undefined",
                i + 1
            )));
        }
        total += (current - prior) / prior;
    }

    Ok(total / Decimal::from(revenues.len() - 1))
}

/// EBIT / revenue for every period present in both series (joined on end
/// date), most-recent-first. Periods with zero revenue are skipped.
pub fn operating_margins(revenue: &ConceptSeries, ebit: &ConceptSeries) -> Vec<Rate> {
    revenue
        .points
        .iter()
        .filter(|r| !r.value.is_zero())
        .filter_map(|r| {
            ebit.points
                .iter()
                .find(|e| e.end_date == r.end_date)
                .map(|e| e.value / r.value)
        })
        .collect()
}

/// tax_expense / pretax_income for the latest period both series report.
///
/// Zero pretax income or no overlapping period falls back to `default_rate`.
/// A computed rate <= 0 is raised to `floor`.
pub fn effective_tax_rate(
    tax_expense: Option<&ConceptSeries>,
    pretax_income: Option<&ConceptSeries>,
    default_rate: Rate,
    floor: Rate,
) -> (Rate, TaxRateSource) {
    let latest = match (tax_expense, pretax_income) {
        (Some(tax), Some(pretax)) => pretax.points.iter().find_map(|p| {
            tax.points
                .iter()
                .find(|t| t.end_date == p.end_date)
                .map(|t| (t.value, p.value))
        }),
        _ => None,
    };

    match latest {
        Some((_, pretax)) if pretax.is_zero() => (default_rate, TaxRateSource::Defaulted),
        Some((tax, pretax)) => match tax.checked_div(pretax) {
            Some(rate) if rate <= Decimal::ZERO => (floor, TaxRateSource::Floored),
            Some(rate) => (rate, TaxRateSource::Computed),
            // Ratio outside the decimal range
            None => (default_rate, TaxRateSource::Defaulted),
        },
        None => (default_rate, TaxRateSource::Defaulted),
    }
}

/// Debt counted under `basis`.
pub fn total_debt(long_term_debt: Money, short_term_debt: Money, basis: DebtBasis) -> Money {
    match basis {
        DebtBasis::LongTermOnly => long_term_debt,
        DebtBasis::LongAndShortTerm => long_term_debt + short_term_debt,
    }
}

/// Cash net of debt counted under `basis`.
pub fn cash_minus_debt(
    cash: Money,
    long_term_debt: Money,
    short_term_debt: Money,
    basis: DebtBasis,
) -> Money {
    cash - total_debt(long_term_debt, short_term_debt, basis)
}

/// Revenue per unit of invested capital: revenue / (debt + equity - cash).
///
/// `None` when invested capital is not positive.
pub fn sales_to_capital(revenue: Money, debt: Money, equity: Money, cash: Money) -> Option<Rate> {
    let invested = debt + equity - cash;
    if invested <= Decimal::ZERO {
        None
    } else {
        Some(revenue / invested)
    }
}
