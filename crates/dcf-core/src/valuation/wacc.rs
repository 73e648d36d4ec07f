use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DcfError;
use crate::resolver::FinancialInputBundle;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::DcfResult;

use super::assumptions::{EquityWeightBasis, ValuationAssumptions};

/// Components of the Weighted Average Cost of Capital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaccBreakdown {
    /// Weighted average cost of capital
    pub wacc: Rate,
    /// Cost of equity via CAPM
    pub cost_of_equity: Rate,
    /// Pre-tax cost of debt
    pub cost_of_debt: Rate,
    pub after_tax_cost_of_debt: Rate,
    pub debt_weight: Rate,
    pub equity_weight: Rate,
    /// Beta used in the calculation
    pub beta: Decimal,
    /// Debt and equity values the weights were taken from
    pub debt_value: Money,
    pub equity_value: Money,
}

/// Calculate WACC from the bundle's capital structure.
///
/// Cost of equity: Ke = Rf + Beta * MRP
/// Cost of debt: Kd = interest_expense / total_debt (0 without debt), unless supplied
/// WACC = Wd * Kd * (1 - t) + We * Ke
pub fn calculate_wacc(
    bundle: &FinancialInputBundle,
    assumptions: &ValuationAssumptions,
) -> DcfResult<ComputationOutput<WaccBreakdown>> {
    let mut warnings: Vec<String> = Vec::new();
    let breakdown = compute_wacc(bundle, assumptions, &mut warnings)?;
    Ok(with_metadata(
        "WACC via CAPM, book or market weights",
        assumptions,
        warnings,
        breakdown,
    ))
}

/// The discount rate a valuation uses: the override if one is supplied,
/// otherwise the WACC formula. The formula is not evaluated when overridden.
pub fn resolve_discount_rate(
    bundle: &FinancialInputBundle,
    assumptions: &ValuationAssumptions,
    warnings: &mut Vec<String>,
) -> DcfResult<(Rate, Option<WaccBreakdown>)> {
    match assumptions.wacc_override {
        Some(rate) => {
            debug!(wacc = %rate, "using WACC override");
            Ok((rate, None))
        }
        None => {
            let breakdown = compute_wacc(bundle, assumptions, warnings)?;
            Ok((breakdown.wacc, Some(breakdown)))
        }
    }
}

pub(crate) fn compute_wacc(
    bundle: &FinancialInputBundle,
    assumptions: &ValuationAssumptions,
    warnings: &mut Vec<String>,
) -> DcfResult<WaccBreakdown> {
    let policy = &assumptions.policy;

    let beta = assumptions
        .beta
        .or(bundle.beta)
        .ok_or_else(|| DcfError::InvalidAssumption {
            field: "beta".into(),
            reason: "Beta is required to compute WACC (or supply wacc_override)".into(),
        })?;

    // --- Capital structure ---
    let debt_value = bundle.total_debt(policy.debt_basis);
    let equity_value = match policy.equity_weight_basis {
        EquityWeightBasis::BookEquity => bundle.equity,
        EquityWeightBasis::MarketCap => {
            bundle.market_cap().ok_or_else(|| DcfError::InvalidAssumption {
                field: "policy.equity_weight_basis".into(),
                reason: "Market-cap weighting requires a current price".into(),
            })?
        }
    };
    let capital = debt_value + equity_value;
    if capital <= Decimal::ZERO {
        return Err(DcfError::InvalidAssumption {
            field: "capital_structure".into(),
            reason: format!(
                "Debt ({debt_value}) plus equity ({equity_value}) must be positive to weight WACC"
            ),
        });
    }
    let debt_weight = debt_value
        .checked_div(capital)
        .ok_or_else(|| DcfError::InvalidAssumption {
            field: "capital_structure".into(),
            reason: format!("Debt weight of {debt_value} over {capital} exceeds the decimal range"),
        })?;
    let equity_weight = Decimal::ONE - debt_weight;
    if equity_value < Decimal::ZERO {
        warnings.push(format!(
            "Negative equity ({equity_value}) gives a debt weight of {debt_weight}; consider market-cap weights"
        ));
    }

    // --- Costs ---
    let cost_of_equity = assumptions.risk_free_rate + beta * assumptions.market_risk_premium;
    let cost_of_debt = match assumptions.cost_of_debt {
        Some(kd) => kd,
        None if debt_value.is_zero() => Decimal::ZERO,
        None => bundle
            .interest_expense
            .checked_div(debt_value)
            .ok_or_else(|| DcfError::InvalidInput {
                field: "interest_expense".into(),
                reason: format!(
                    "Implied cost of debt of {} over {debt_value} exceeds the decimal range",
                    bundle.interest_expense
                ),
            })?,
    };
    let after_tax_cost_of_debt = cost_of_debt * (Decimal::ONE - bundle.effective_tax_rate);

    let wacc = debt_weight * after_tax_cost_of_debt + equity_weight * cost_of_equity;

    // --- Reasonableness warnings ---
    if beta > dec!(3.0) {
        warnings.push(format!(
            "High beta ({beta}): verify market data; betas above 3.0 are unusual"
        ));
    }
    if wacc > dec!(0.20) {
        warnings.push(format!(
            "WACC of {wacc} exceeds 20%; appropriate for high-risk situations only"
        ));
    }

    debug!(%wacc, %cost_of_equity, %cost_of_debt, %debt_weight, "computed WACC");

    Ok(WaccBreakdown {
        wacc,
        cost_of_equity,
        cost_of_debt,
        after_tax_cost_of_debt,
        debt_weight,
        equity_weight,
        beta,
        debt_value,
        equity_value,
    })
}
