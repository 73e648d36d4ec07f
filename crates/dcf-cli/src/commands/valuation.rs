use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use dcf_core::resolver::{DebtBasis, FinancialInputBundle, StatementFact};
use dcf_core::valuation::{
    self, EquityWeightBasis, MarginPolicy, ReinvestmentPolicy, ValuationAssumptions,
};

use super::resolve::{resolve_bundle, FactsArgs};
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DebtBasisArg {
    /// Long-term debt only
    LongTerm,
    /// Long-term plus short-term borrowings
    All,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EquityWeightArg {
    Book,
    Market,
}

/// Where the input bundle comes from: a resolved bundle file, or raw facts
/// resolved on the fly.
#[derive(Args, Debug, Default)]
pub struct BundleArgs {
    /// Path to a JSON FinancialInputBundle (skips resolution)
    #[arg(long, conflicts_with = "facts")]
    pub bundle: Option<String>,

    #[command(flatten)]
    pub source: FactsArgs,
}

/// Valuation assumptions. Flags override values from `--config`.
#[derive(Args, Debug, Default)]
#[command(allow_hyphen_values = true)]
pub struct AssumptionArgs {
    /// Assumptions file (YAML or JSON) holding a ValuationAssumptions document
    #[arg(long)]
    pub config: Option<String>,

    /// Risk-free rate (e.g. 0.04 for 4%)
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Levered beta (defaults to the market snapshot's beta)
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Market risk premium (e.g. 0.055 for 5.5%)
    #[arg(long, alias = "mrp")]
    pub market_risk_premium: Option<Decimal>,

    /// Pre-tax cost of debt (defaults to interest expense / debt)
    #[arg(long)]
    pub cost_of_debt: Option<Decimal>,

    /// Fixed discount rate replacing the WACC formula
    #[arg(long, alias = "wacc")]
    pub wacc_override: Option<Decimal>,

    /// Projection horizon in years
    #[arg(long)]
    pub projection_years: Option<u32>,

    /// Fraction of NOPAT reinvested
    #[arg(long)]
    pub reinvestment_rate: Option<Decimal>,

    /// Perpetual growth after the horizon (defaults to the risk-free rate)
    #[arg(long)]
    pub terminal_growth: Option<Decimal>,

    /// Converge the operating margin to this target by the final year
    #[arg(long)]
    pub target_margin: Option<Decimal>,

    /// Operating margin used when there is no margin history
    #[arg(long)]
    pub fallback_margin: Option<Decimal>,

    /// Debt counted in the equity bridge and WACC weights
    #[arg(long, value_enum)]
    pub debt_basis: Option<DebtBasisArg>,

    /// Equity measure for WACC weights
    #[arg(long, value_enum)]
    pub equity_weights: Option<EquityWeightArg>,

    /// Reinvest via a sales-to-capital ratio; 0 derives it from the bundle
    #[arg(long)]
    pub sales_to_capital: Option<Decimal>,

    /// Years to hold the initial growth rate before it decays
    #[arg(long)]
    pub high_growth_years: Option<u32>,

    /// Length of the growth decay in years
    #[arg(long)]
    pub decay_years: Option<u32>,
}

impl AssumptionArgs {
    /// Load `--config` (or defaults) and apply flag overrides.
    pub fn assumptions(&self) -> Result<ValuationAssumptions, Box<dyn std::error::Error>> {
        let base = match self.config {
            Some(ref path) => input::file::read_config(path)?,
            None => ValuationAssumptions::default(),
        };
        Ok(self.apply(base))
    }

    fn apply(&self, mut a: ValuationAssumptions) -> ValuationAssumptions {
        if let Some(v) = self.risk_free_rate {
            a.risk_free_rate = v;
        }
        if self.beta.is_some() {
            a.beta = self.beta;
        }
        if let Some(v) = self.market_risk_premium {
            a.market_risk_premium = v;
        }
        if self.cost_of_debt.is_some() {
            a.cost_of_debt = self.cost_of_debt;
        }
        if self.wacc_override.is_some() {
            a.wacc_override = self.wacc_override;
        }
        if let Some(v) = self.projection_years {
            a.projection_years = v;
        }
        if let Some(v) = self.reinvestment_rate {
            a.reinvestment_rate = v;
        }
        if self.terminal_growth.is_some() {
            a.terminal_growth_rate = self.terminal_growth;
        }

        // --- Policy ---
        let policy = &mut a.policy;
        if let Some(target_margin) = self.target_margin {
            policy.margin = MarginPolicy::Converging { target_margin };
        }
        if let Some(v) = self.fallback_margin {
            policy.fallback_operating_margin = v;
        }
        if let Some(basis) = self.debt_basis {
            policy.debt_basis = match basis {
                DebtBasisArg::LongTerm => DebtBasis::LongTermOnly,
                DebtBasisArg::All => DebtBasis::LongAndShortTerm,
            };
        }
        if let Some(weights) = self.equity_weights {
            policy.equity_weight_basis = match weights {
                EquityWeightArg::Book => EquityWeightBasis::BookEquity,
                EquityWeightArg::Market => EquityWeightBasis::MarketCap,
            };
        }
        if let Some(ratio) = self.sales_to_capital {
            policy.reinvestment = ReinvestmentPolicy::SalesToCapital {
                ratio: (!ratio.is_zero()).then_some(ratio),
            };
        }
        if let Some(v) = self.high_growth_years {
            policy.high_growth_years = v;
        }
        if self.decay_years.is_some() {
            policy.decay_years = self.decay_years;
        }
        a
    }
}

/// Arguments for DCF valuation
#[derive(Args)]
pub struct ValueArgs {
    #[command(flatten)]
    pub input: BundleArgs,

    #[command(flatten)]
    pub assumptions: AssumptionArgs,
}

/// Arguments for WACC calculation
#[derive(Args)]
pub struct WaccArgs {
    #[command(flatten)]
    pub input: BundleArgs,

    #[command(flatten)]
    pub assumptions: AssumptionArgs,
}

/// Load a bundle from `--bundle`, `--facts`, or stdin. Piped input is a
/// bundle object or an array of facts.
fn load_bundle(args: &BundleArgs) -> Result<FinancialInputBundle, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.bundle {
        return input::file::read_json(path);
    }
    if let Some(ref path) = args.source.facts {
        let facts: Vec<StatementFact> = input::file::read_json(path)?;
        return Ok(resolve_bundle(&args.source, &facts)?.0);
    }
    match input::stdin::read_stdin()? {
        Some(Value::Array(items)) => {
            let facts: Vec<StatementFact> = serde_json::from_value(Value::Array(items))?;
            Ok(resolve_bundle(&args.source, &facts)?.0)
        }
        Some(data) => Ok(serde_json::from_value(data)?),
        None => Err("--bundle or --facts is required (or pipe JSON on stdin)".into()),
    }
}

pub fn run_value(args: ValueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bundle = load_bundle(&args.input)?;
    let assumptions = args.assumptions.assumptions()?;
    let result = valuation::compute_valuation(&bundle, &assumptions)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_wacc(args: WaccArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bundle = load_bundle(&args.input)?;
    let assumptions = args.assumptions.assumptions()?;
    let result = valuation::calculate_wacc(&bundle, &assumptions)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flags_override_config_values() {
        let base = ValuationAssumptions {
            risk_free_rate: dec!(0.03),
            projection_years: 10,
            ..Default::default()
        };
        let args = AssumptionArgs {
            risk_free_rate: Some(dec!(0.045)),
            wacc_override: Some(dec!(0.09)),
            debt_basis: Some(DebtBasisArg::All),
            ..Default::default()
        };
        let a = args.apply(base);
        assert_eq!(a.risk_free_rate, dec!(0.045));
        assert_eq!(a.projection_years, 10);
        assert_eq!(a.wacc_override, Some(dec!(0.09)));
        assert_eq!(a.policy.debt_basis, DebtBasis::LongAndShortTerm);
    }

    #[test]
    fn test_unset_flags_keep_config() {
        let base = ValuationAssumptions {
            beta: Some(dec!(1.3)),
            terminal_growth_rate: Some(dec!(0.025)),
            ..Default::default()
        };
        let a = AssumptionArgs::default().apply(base.clone());
        assert_eq!(a, base);
    }

    #[test]
    fn test_policy_flags() {
        let args = AssumptionArgs {
            target_margin: Some(dec!(0.3)),
            sales_to_capital: Some(dec!(0)),
            equity_weights: Some(EquityWeightArg::Market),
            high_growth_years: Some(3),
            ..Default::default()
        };
        let a = args.apply(ValuationAssumptions::default());
        assert_eq!(
            a.policy.margin,
            MarginPolicy::Converging {
                target_margin: dec!(0.3)
            }
        );
        assert_eq!(
            a.policy.reinvestment,
            ReinvestmentPolicy::SalesToCapital { ratio: None }
        );
        assert_eq!(a.policy.equity_weight_basis, EquityWeightBasis::MarketCap);
        assert_eq!(a.policy.high_growth_years, 3);
    }
}
