use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DcfError;
use crate::resolver::FinancialInputBundle;
use crate::time_value::{discount_factor, gordon_growth_value};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::DcfResult;

use super::assumptions::{MarginPolicy, ReinvestmentPolicy, ValuationAssumptions};
use super::growth::growth_schedule;
use super::wacc::{resolve_discount_rate, WaccBreakdown};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Projection for a single year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedYear {
    pub year: u32,
    pub growth_rate: Rate,
    pub revenue: Money,
    pub operating_margin: Rate,
    pub ebit: Money,
    pub nopat: Money,
    /// Portion of NOPAT retained to fund growth
    pub reinvestment: Money,
    pub fcf: Money,
    pub discount_factor: Rate,
    pub present_value: Money,
}

/// Output of the DCF valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// Year-by-year projections
    pub years: Vec<ProjectedYear>,
    /// Sum of present values of the explicit-period free cash flows
    pub sum_pv_fcf: Money,
    /// Gordon growth value at the end of the horizon
    pub terminal_value: Money,
    pub pv_of_terminal_value: Money,
    /// Enterprise value = sum(PV fcf) + PV(TV)
    pub enterprise_value: Money,
    pub cash: Money,
    /// Debt under the policy's debt basis
    pub total_debt: Money,
    /// Equity value = EV + cash - debt
    pub equity_value: Money,
    pub price_per_share: Money,
    /// Discount rate actually applied
    pub wacc_used: Rate,
    /// WACC components; absent when an override was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wacc_breakdown: Option<WaccBreakdown>,
    pub terminal_growth_rate: Rate,
    /// PV(TV) as a fraction of enterprise value
    pub terminal_value_pct: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Money>,
    /// price_per_share / current_price - 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upside: Option<Rate>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the two-stage FCF valuation.
///
/// Every assumption is checked before any projection work; the same bundle
/// and assumptions always produce the same output.
pub fn compute_valuation(
    bundle: &FinancialInputBundle,
    assumptions: &ValuationAssumptions,
) -> DcfResult<ComputationOutput<ProjectionResult>> {
    let mut warnings: Vec<String> = Vec::new();

    // --- Validate ---
    bundle.validate()?;
    assumptions.validate()?;

    let terminal_growth = assumptions.terminal_growth();
    let (wacc, wacc_breakdown) = resolve_discount_rate(bundle, assumptions, &mut warnings)?;
    validate_discount_rate(wacc, terminal_growth)?;

    let base_margin = resolve_base_margin(bundle, assumptions, &mut warnings);
    let sales_to_capital = resolve_sales_to_capital(bundle, assumptions)?;

    for field in &bundle.defaulted {
        warnings.push(format!("Input '{field}' was not reported and uses its default"));
    }

    // --- Project cash flows ---
    let years = build_projections(
        bundle,
        assumptions,
        wacc,
        terminal_growth,
        base_margin,
        sales_to_capital,
    )?;

    let sum_pv_fcf = years
        .iter()
        .try_fold(Decimal::ZERO, |acc, y| acc.checked_add(y.present_value))
        .ok_or_else(|| out_of_range("projection_years", "Sum of discounted cash flows"))?;
    let last = years.last().ok_or_else(|| {
        DcfError::DataInsufficient("No projection years generated".into())
    })?;

    // --- Terminal value ---
    let terminal_value = gordon_growth_value(last.fcf, wacc, terminal_growth)?;
    let pv_of_terminal_value = terminal_value
        .checked_mul(last.discount_factor)
        .ok_or_else(|| out_of_range("terminal_growth_rate", "Discounted terminal value"))?;

    // --- Enterprise value ---
    let enterprise_value = sum_pv_fcf
        .checked_add(pv_of_terminal_value)
        .ok_or_else(|| out_of_range("terminal_growth_rate", "Enterprise value"))?;

    let terminal_value_pct = if enterprise_value.is_zero() {
        Decimal::ZERO
    } else {
        pv_of_terminal_value
            .checked_div(enterprise_value)
            .ok_or_else(|| out_of_range("terminal_growth_rate", "Terminal value share of EV"))?
    };
    if terminal_value_pct > dec!(0.75) {
        warnings.push(format!(
            "Terminal value represents {:.1}% of enterprise value; consider extending the projection horizon",
            terminal_value_pct.saturating_mul(dec!(100))
        ));
    }

    // --- Equity bridge ---
    let total_debt = bundle.total_debt(assumptions.policy.debt_basis);
    let equity_value = enterprise_value
        .checked_add(bundle.cash)
        .and_then(|v| v.checked_sub(total_debt))
        .ok_or_else(|| out_of_range("cash", "Equity value"))?;
    if equity_value < Decimal::ZERO {
        warnings.push(format!(
            "Equity value is negative ({equity_value}); debt exceeds enterprise value plus cash"
        ));
    }
    let price_per_share = equity_value
        .checked_div(bundle.shares_outstanding)
        .ok_or_else(|| out_of_range("shares_outstanding", "Price per share"))?;

    let upside = match bundle.current_price {
        Some(p) if p > Decimal::ZERO => price_per_share
            .checked_div(p)
            .and_then(|ratio| ratio.checked_sub(Decimal::ONE)),
        _ => None,
    };

    info!(
        %enterprise_value,
        %equity_value,
        %price_per_share,
        wacc = %wacc,
        "valuation complete"
    );

    let output = ProjectionResult {
        years,
        sum_pv_fcf,
        terminal_value,
        pv_of_terminal_value,
        enterprise_value,
        cash: bundle.cash,
        total_debt,
        equity_value,
        price_per_share,
        wacc_used: wacc,
        wacc_breakdown,
        terminal_growth_rate: terminal_growth,
        terminal_value_pct,
        current_price: bundle.current_price,
        upside,
    };

    Ok(with_metadata(
        "2-Stage FCF DCF (growth decay to terminal rate)",
        assumptions,
        warnings,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Error for an intermediate that leaves the decimal range, attributed to
/// the assumption that drives it.
fn out_of_range(field: &str, quantity: &str) -> DcfError {
    DcfError::InvalidAssumption {
        field: field.into(),
        reason: format!("{quantity} exceeds the decimal range"),
    }
}

fn validate_discount_rate(wacc: Rate, terminal_growth: Rate) -> DcfResult<()> {
    if wacc <= dec!(-1) {
        return Err(DcfError::InvalidAssumption {
            field: "wacc".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    if wacc <= terminal_growth {
        return Err(DcfError::InvalidAssumption {
            field: "terminal_growth_rate".into(),
            reason: format!(
                "WACC ({wacc}) must exceed the terminal growth rate ({terminal_growth}); terminal value is undefined otherwise"
            ),
        });
    }
    Ok(())
}

fn resolve_base_margin(
    bundle: &FinancialInputBundle,
    assumptions: &ValuationAssumptions,
    warnings: &mut Vec<String>,
) -> Rate {
    match bundle.average_operating_margin() {
        Some(m) => m,
        None => {
            let fallback = assumptions.policy.fallback_operating_margin;
            warnings.push(format!(
                "No operating margin history; using fallback margin of {fallback}"
            ));
            fallback
        }
    }
}

fn resolve_sales_to_capital(
    bundle: &FinancialInputBundle,
    assumptions: &ValuationAssumptions,
) -> DcfResult<Option<Rate>> {
    match assumptions.policy.reinvestment {
        ReinvestmentPolicy::FixedRate => Ok(None),
        ReinvestmentPolicy::SalesToCapital { ratio: Some(r) } => Ok(Some(r)),
        ReinvestmentPolicy::SalesToCapital { ratio: None } => bundle
            .sales_to_capital(assumptions.policy.debt_basis)
            .filter(|r| *r > Decimal::ZERO)
            .map(Some)
            .ok_or_else(|| DcfError::InvalidAssumption {
                field: "policy.reinvestment".into(),
                reason: "Sales-to-capital ratio cannot be derived: invested capital is not positive".into(),
            }),
    }
}

fn margin_for_year(policy: &MarginPolicy, base: Rate, year: u32, horizon: u32) -> Rate {
    match policy {
        MarginPolicy::Constant => base,
        MarginPolicy::Converging { target_margin } => {
            base + (*target_margin - base) * Decimal::from(year) / Decimal::from(horizon)
        }
    }
}

fn build_projections(
    bundle: &FinancialInputBundle,
    assumptions: &ValuationAssumptions,
    wacc: Rate,
    terminal_growth: Rate,
    base_margin: Rate,
    sales_to_capital: Option<Rate>,
) -> DcfResult<Vec<ProjectedYear>> {
    let n_years = assumptions.projection_years;
    let growth = growth_schedule(
        bundle.yoy_growth,
        terminal_growth,
        assumptions.risk_free_rate,
        n_years,
        &assumptions.policy,
    );

    let mut prev_revenue = bundle
        .latest_revenue()
        .ok_or_else(|| DcfError::DataInsufficient("No revenue to project from".into()))?;
    let tax_rate = bundle.effective_tax_rate;
    let mut projections = Vec::with_capacity(n_years as usize);

    for (idx, growth_rate) in growth.into_iter().enumerate() {
        let year = idx as u32 + 1;
        let in_year =
            |quantity: &str| out_of_range("projection_years", &format!("{quantity} in year {year}"));

        let revenue = prev_revenue
            .checked_mul(Decimal::ONE + growth_rate)
            .ok_or_else(|| in_year("Revenue"))?;
        let operating_margin =
            margin_for_year(&assumptions.policy.margin, base_margin, year, n_years);
        let ebit = revenue
            .checked_mul(operating_margin)
            .ok_or_else(|| in_year("EBIT"))?;
        let nopat = ebit
            .checked_mul(Decimal::ONE - tax_rate)
            .ok_or_else(|| in_year("NOPAT"))?;

        let reinvestment = match sales_to_capital {
            Some(ratio) => revenue
                .checked_sub(prev_revenue)
                .and_then(|delta| delta.checked_div(ratio)),
            None => nopat.checked_mul(assumptions.reinvestment_rate),
        }
        .ok_or_else(|| in_year("Reinvestment"))?;
        let fcf = nopat
            .checked_sub(reinvestment)
            .ok_or_else(|| in_year("Free cash flow"))?;

        let discount_factor = discount_factor(wacc, year)?;
        let present_value = fcf
            .checked_mul(discount_factor)
            .ok_or_else(|| in_year("Present value"))?;

        projections.push(ProjectedYear {
            year,
            growth_rate,
            revenue,
            operating_margin,
            ebit,
            nopat,
            reinvestment,
            fcf,
            discount_factor,
            present_value,
        });

        prev_revenue = revenue;
    }

    Ok(projections)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::assumptions::ProjectionPolicy;

    fn sample_bundle() -> FinancialInputBundle {
        FinancialInputBundle {
            revenues: vec![dec!(1000), dec!(900), dec!(810)],
            operating_margins: vec![dec!(0.20)],
            yoy_growth: dec!(0.10),
            cash: dec!(150),
            long_term_debt: dec!(300),
            short_term_debt: dec!(50),
            equity: dec!(700),
            interest_expense: dec!(15),
            effective_tax_rate: dec!(0.21),
            shares_outstanding: dec!(100),
            beta: Some(dec!(1.1)),
            current_price: None,
            defaulted: vec![],
        }
    }

    fn sample_assumptions() -> ValuationAssumptions {
        ValuationAssumptions {
            risk_free_rate: dec!(0.04),
            wacc_override: Some(dec!(0.08)),
            projection_years: 5,
            reinvestment_rate: dec!(0.20),
            ..Default::default()
        }
    }

    #[test]
    fn test_year_one_projection() {
        let out = compute_valuation(&sample_bundle(), &sample_assumptions())
            .unwrap()
            .result;
        let y1 = &out.years[0];

        // growth 0.10 - 0.06 * 1/5 = 0.088
        assert_eq!(y1.growth_rate, dec!(0.088));
        assert_eq!(y1.revenue, dec!(1088));
        assert_eq!(y1.ebit, dec!(217.6));
        // NOPAT = 217.6 * 0.79 = 171.904
        assert_eq!(y1.nopat, dec!(171.904));
        // FCF = 171.904 * 0.8 = 137.5232
        assert_eq!(y1.fcf, dec!(137.5232));
        assert_eq!(y1.reinvestment, dec!(34.3808));
    }

    #[test]
    fn test_equity_bridge_and_price() {
        let out = compute_valuation(&sample_bundle(), &sample_assumptions())
            .unwrap()
            .result;
        assert_eq!(out.total_debt, dec!(300));
        assert_eq!(out.equity_value, out.enterprise_value + dec!(150) - dec!(300));
        assert_eq!(out.price_per_share, out.equity_value / dec!(100));
        assert_eq!(
            out.enterprise_value,
            out.sum_pv_fcf + out.pv_of_terminal_value
        );
    }

    #[test]
    fn test_terminal_value_uses_last_fcf() {
        let out = compute_valuation(&sample_bundle(), &sample_assumptions())
            .unwrap()
            .result;
        let last = out.years.last().unwrap();
        let expected = last.fcf * dec!(1.04) / dec!(0.04);
        assert_eq!(out.terminal_value, expected);
        assert_eq!(out.pv_of_terminal_value, expected * last.discount_factor);
    }

    #[test]
    fn test_short_term_debt_in_bridge() {
        let mut a = sample_assumptions();
        a.policy.debt_basis = crate::resolver::DebtBasis::LongAndShortTerm;
        let out = compute_valuation(&sample_bundle(), &a).unwrap().result;
        assert_eq!(out.total_debt, dec!(350));
    }

    #[test]
    fn test_fallback_margin_when_no_history() {
        let mut b = sample_bundle();
        b.operating_margins.clear();
        let result = compute_valuation(&b, &sample_assumptions()).unwrap();
        assert_eq!(result.result.years[0].operating_margin, dec!(0.10));
        assert!(result.warnings.iter().any(|w| w.contains("fallback margin")));
    }

    #[test]
    fn test_converging_margin_hits_target_in_final_year() {
        let mut a = sample_assumptions();
        a.policy.margin = MarginPolicy::Converging {
            target_margin: dec!(0.30),
        };
        let out = compute_valuation(&sample_bundle(), &a).unwrap().result;
        assert_eq!(out.years[0].operating_margin, dec!(0.22));
        assert_eq!(out.years[4].operating_margin, dec!(0.30));
    }

    #[test]
    fn test_sales_to_capital_reinvestment() {
        let mut a = sample_assumptions();
        a.policy = ProjectionPolicy {
            reinvestment: ReinvestmentPolicy::SalesToCapital {
                ratio: Some(dec!(2)),
            },
            ..Default::default()
        };
        let out = compute_valuation(&sample_bundle(), &a).unwrap().result;
        // delta revenue 88 / 2 = 44
        assert_eq!(out.years[0].reinvestment, dec!(44));
        assert_eq!(out.years[0].fcf, dec!(171.904) - dec!(44));
    }

    #[test]
    fn test_derived_sales_to_capital() {
        let mut a = sample_assumptions();
        a.policy.reinvestment = ReinvestmentPolicy::SalesToCapital { ratio: None };
        // 1000 / (300 + 700 - 150) = 1.17647...
        let out = compute_valuation(&sample_bundle(), &a).unwrap().result;
        let expected = dec!(88) / (dec!(1000) / dec!(850));
        assert!((out.years[0].reinvestment - expected).abs() < dec!(0.000001));
    }

    #[test]
    fn test_underivable_sales_to_capital_rejected() {
        let mut b = sample_bundle();
        b.equity = Decimal::ZERO;
        b.long_term_debt = Decimal::ZERO;
        let mut a = sample_assumptions();
        a.policy.reinvestment = ReinvestmentPolicy::SalesToCapital { ratio: None };
        assert!(matches!(
            compute_valuation(&b, &a),
            Err(DcfError::InvalidAssumption { .. })
        ));
    }

    #[test]
    fn test_upside_against_current_price() {
        let mut b = sample_bundle();
        b.current_price = Some(dec!(10));
        let out = compute_valuation(&b, &sample_assumptions()).unwrap().result;
        let upside = out.upside.unwrap();
        assert_eq!(upside, out.price_per_share / dec!(10) - Decimal::ONE);
    }

    #[test]
    fn test_computed_wacc_is_used_without_override() {
        let mut a = sample_assumptions();
        a.wacc_override = None;
        a.market_risk_premium = dec!(0.055);
        let out = compute_valuation(&sample_bundle(), &a).unwrap().result;
        let breakdown = out.wacc_breakdown.unwrap();
        assert_eq!(out.wacc_used, breakdown.wacc);
    }

    #[test]
    fn test_defaulted_inputs_surface_as_warnings() {
        let mut b = sample_bundle();
        b.defaulted = vec!["interest_expense".into()];
        let result = compute_valuation(&b, &sample_assumptions()).unwrap();
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("interest_expense")));
    }

    #[test]
    fn test_methodology() {
        let result = compute_valuation(&sample_bundle(), &sample_assumptions()).unwrap();
        assert_eq!(
            result.methodology,
            "2-Stage FCF DCF (growth decay to terminal rate)"
        );
    }
}
