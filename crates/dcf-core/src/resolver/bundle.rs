use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DcfError;
use crate::types::{Money, Rate, Shares};
use crate::DcfResult;

use super::concepts::ResolverConfig;
use super::facts::{MarketSnapshot, StatementFact};
use super::ratios::{self, DebtBasis, TaxRateSource};
use super::series::{latest_fact, resolve_concept};

/// Normalized inputs for one valuation, built once from statement data and
/// not mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialInputBundle {
    /// Trailing revenues, most-recent-first
    pub revenues: Vec<Money>,
    /// EBIT / revenue for periods where both are reported; may be empty
    pub operating_margins: Vec<Rate>,
    /// Mean period-over-period revenue growth
    pub yoy_growth: Rate,
    pub cash: Money,
    pub long_term_debt: Money,
    pub short_term_debt: Money,
    /// Book value of stockholders' equity
    pub equity: Money,
    pub interest_expense: Money,
    pub effective_tax_rate: Rate,
    pub shares_outstanding: Shares,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Money>,
    /// Fields that fell back to a documented default during resolution
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaulted: Vec<String>,
}

impl FinancialInputBundle {
    pub fn latest_revenue(&self) -> Option<Money> {
        self.revenues.first().copied()
    }

    /// Mean historical operating margin, `None` when no period had both
    /// revenue and EBIT.
    pub fn average_operating_margin(&self) -> Option<Rate> {
        if self.operating_margins.is_empty() {
            return None;
        }
        let sum: Rate = self.operating_margins.iter().sum();
        Some(sum / Decimal::from(self.operating_margins.len()))
    }

    pub fn total_debt(&self, basis: DebtBasis) -> Money {
        ratios::total_debt(self.long_term_debt, self.short_term_debt, basis)
    }

    pub fn cash_minus_debt(&self, basis: DebtBasis) -> Money {
        ratios::cash_minus_debt(self.cash, self.long_term_debt, self.short_term_debt, basis)
    }

    pub fn sales_to_capital(&self, basis: DebtBasis) -> Option<Rate> {
        let revenue = self.latest_revenue()?;
        ratios::sales_to_capital(revenue, self.total_debt(basis), self.equity, self.cash)
    }

    /// current_price * shares_outstanding, when a price is known.
    pub fn market_cap(&self) -> Option<Money> {
        self.current_price.map(|p| p * self.shares_outstanding)
    }

    /// Check the invariants a hand-built bundle must satisfy before valuation.
    pub fn validate(&self) -> DcfResult<()> {
        if self.revenues.len() < 2 {
            return Err(DcfError::DataInsufficient(format!(
                "At least 2 periods of revenue are required, got {}",
                self.revenues.len()
            )));
        }
        if self.shares_outstanding <= Decimal::ZERO {
            return Err(DcfError::InvalidAssumption {
                field: "shares_outstanding".into(),
                reason: "Shares outstanding must be positive to compute a price per share".into(),
            });
        }
        Ok(())
    }
}

/// Build a bundle from statement rows with the default configuration and no
/// market data, reading `years` periods of series metrics.
pub fn resolve_inputs(facts: &[StatementFact], years: usize) -> DcfResult<FinancialInputBundle> {
    resolve_inputs_with(
        facts,
        &MarketSnapshot::default(),
        &ResolverConfig::with_years(years),
    )
}

/// Build a bundle from statement rows and a market snapshot.
///
/// Revenue and shares outstanding are required; everything else degrades to a
/// documented default, recorded in `defaulted` and logged.
pub fn resolve_inputs_with(
    facts: &[StatementFact],
    market: &MarketSnapshot,
    config: &ResolverConfig,
) -> DcfResult<FinancialInputBundle> {
    let concepts = &config.concepts;
    let form = config.form.as_str();
    let mut defaulted = Vec::new();

    // --- Revenue (required) ---
    let revenue = resolve_concept(&concepts.revenue, facts, form, config.years).ok_or_else(
        || DcfError::MissingRequiredConcept {
            metric: "revenue".into(),
            candidates: concepts.revenue.clone(),
        },
    )?;
    let revenues = revenue.values();
    let yoy_growth = ratios::yoy_growth(&revenues)?;

    // --- Shares outstanding (required) ---
    let shares_outstanding = match market.shares_outstanding {
        Some(shares) => shares,
        None => latest_fact(&concepts.shares_outstanding, facts, form)
            .map(|f| f.value)
            .ok_or_else(|| DcfError::MissingRequiredConcept {
                metric: "shares_outstanding".into(),
                candidates: concepts.shares_outstanding.clone(),
            })?,
    };

    // --- Operating margins ---
    let operating_margins =
        match resolve_concept(&concepts.operating_income, facts, form, config.years) {
            Some(ebit) => ratios::operating_margins(&revenue, &ebit),
            None => Vec::new(),
        };
    if operating_margins.is_empty() {
        warn!("no overlapping revenue and operating income periods; margin fallback applies");
        defaulted.push("operating_margins".to_string());
    }

    // --- Effective tax rate ---
    let tax = resolve_concept(&concepts.income_tax_expense, facts, form, config.years);
    let pretax = resolve_concept(&concepts.pretax_income, facts, form, config.years);
    let (effective_tax_rate, tax_source) = ratios::effective_tax_rate(
        tax.as_ref(),
        pretax.as_ref(),
        config.default_tax_rate,
        config.tax_rate_floor,
    );
    match tax_source {
        TaxRateSource::Computed => {}
        TaxRateSource::Floored => {
            warn!(rate = %effective_tax_rate, "computed tax rate <= 0; using floor");
            defaulted.push("effective_tax_rate".to_string());
        }
        TaxRateSource::Defaulted => {
            warn!(rate = %effective_tax_rate, "no usable pretax income; using default tax rate");
            defaulted.push("effective_tax_rate".to_string());
        }
    }

    // --- Balance sheet snapshot (optional, default 0) ---
    let mut optional = |field: &str, candidates: &[String]| -> Money {
        match latest_fact(candidates, facts, form) {
            Some(f) => {
                debug!(field, concept = %f.concept_id, value = %f.value, "resolved latest value");
                f.value
            }
            None => {
                warn!(field, ?candidates, "concept unavailable; defaulting to 0");
                defaulted.push(field.to_string());
                Decimal::ZERO
            }
        }
    };
    let cash = optional("cash", &concepts.cash);
    let long_term_debt = optional("long_term_debt", &concepts.long_term_debt);
    let short_term_debt = optional("short_term_debt", &concepts.short_term_debt);
    let equity = optional("equity", &concepts.equity);
    let interest_expense = optional("interest_expense", &concepts.interest_expense);

    Ok(FinancialInputBundle {
        revenues,
        operating_margins,
        yoy_growth,
        cash,
        long_term_debt,
        short_term_debt,
        equity,
        interest_expense,
        effective_tax_rate,
        shares_outstanding,
        beta: market.beta,
        current_price: market.current_price,
        defaulted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn fact(concept: &str, value: Decimal, end: &str) -> StatementFact {
        let end_date = NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap();
        StatementFact {
            concept_id: concept.into(),
            value,
            unit: "USD".into(),
            start_date: None,
            end_date,
            filing_date: end_date + chrono::Days::new(45),
            form: "10-K".into(),
        }
    }

    fn sample_bundle() -> FinancialInputBundle {
        FinancialInputBundle {
            revenues: vec![dec!(1000), dec!(900)],
            operating_margins: vec![dec!(0.20), dec!(0.10)],
            yoy_growth: dec!(0.1111),
            cash: dec!(100),
            long_term_debt: dec!(200),
            short_term_debt: dec!(50),
            equity: dec!(500),
            interest_expense: dec!(10),
            effective_tax_rate: dec!(0.21),
            shares_outstanding: dec!(10),
            beta: None,
            current_price: Some(dec!(40)),
            defaulted: vec![],
        }
    }

    #[test]
    fn test_average_operating_margin() {
        assert_eq!(sample_bundle().average_operating_margin(), Some(dec!(0.15)));
        let mut b = sample_bundle();
        b.operating_margins.clear();
        assert!(b.average_operating_margin().is_none());
    }

    #[test]
    fn test_debt_views() {
        let b = sample_bundle();
        assert_eq!(b.total_debt(DebtBasis::LongTermOnly), dec!(200));
        assert_eq!(b.total_debt(DebtBasis::LongAndShortTerm), dec!(250));
        assert_eq!(b.cash_minus_debt(DebtBasis::LongTermOnly), dec!(-100));
        assert_eq!(b.market_cap(), Some(dec!(400)));
    }

    #[test]
    fn test_validate_rejects_non_positive_shares() {
        let mut b = sample_bundle();
        b.shares_outstanding = Decimal::ZERO;
        assert!(matches!(
            b.validate(),
            Err(DcfError::InvalidAssumption { .. })
        ));
    }

    #[test]
    fn test_resolve_minimal_statements() {
        let facts = vec![
            fact("Revenues", dec!(1000), "2023-12-31"),
            fact("Revenues", dec!(900), "2022-12-31"),
            fact("CommonStockSharesOutstanding", dec!(50), "2023-12-31"),
        ];
        let bundle = resolve_inputs(&facts, 5).unwrap();
        assert_eq!(bundle.revenues, vec![dec!(1000), dec!(900)]);
        assert_eq!(bundle.shares_outstanding, dec!(50));
        assert_eq!(bundle.cash, Decimal::ZERO);
        assert_eq!(bundle.effective_tax_rate, dec!(0.21));
        for field in ["operating_margins", "effective_tax_rate", "cash", "equity"] {
            assert!(bundle.defaulted.iter().any(|d| d == field), "{field} not defaulted");
        }
    }

    #[test]
    fn test_market_shares_preferred_over_filings() {
        let facts = vec![
            fact("Revenues", dec!(1000), "2023-12-31"),
            fact("Revenues", dec!(900), "2022-12-31"),
            fact("CommonStockSharesOutstanding", dec!(50), "2023-12-31"),
        ];
        let market = MarketSnapshot {
            beta: Some(dec!(1.2)),
            shares_outstanding: Some(dec!(55)),
            current_price: None,
        };
        let bundle = resolve_inputs_with(&facts, &market, &ResolverConfig::default()).unwrap();
        assert_eq!(bundle.shares_outstanding, dec!(55));
        assert_eq!(bundle.beta, Some(dec!(1.2)));
    }
}
