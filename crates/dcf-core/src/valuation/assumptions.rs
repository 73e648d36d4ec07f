use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DcfError;
use crate::resolver::DebtBasis;
use crate::types::Rate;
use crate::DcfResult;

/// How the operating margin evolves over the projection horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MarginPolicy {
    /// Hold the historical average margin for every year
    #[default]
    Constant,
    /// Move linearly from the historical average to `target_margin`,
    /// reaching it in the final projection year
    Converging { target_margin: Rate },
}

/// What the equity weight in WACC is measured on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquityWeightBasis {
    /// Book value of stockholders' equity
    #[default]
    BookEquity,
    /// current_price * shares_outstanding
    MarketCap,
}

/// How much of NOPAT is retained to fund growth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ReinvestmentPolicy {
    /// fcf = nopat * (1 - reinvestment_rate)
    #[default]
    FixedRate,
    /// fcf = nopat - (revenue[n] - revenue[n-1]) / ratio. Without an explicit
    /// ratio the bundle's sales-to-capital ratio is used.
    SalesToCapital {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ratio: Option<Decimal>,
    },
}

/// Policy switches covering the model variants: margin path, debt basis,
/// WACC weighting, reinvestment and growth-stage shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionPolicy {
    pub margin: MarginPolicy,
    /// Substituted when the bundle has no operating margin history
    pub fallback_operating_margin: Rate,
    pub debt_basis: DebtBasis,
    pub equity_weight_basis: EquityWeightBasis,
    pub reinvestment: ReinvestmentPolicy,
    /// Years the initial growth rate is held before decay begins
    pub high_growth_years: u32,
    /// Length of the straight-line decay; defaults to the rest of the horizon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decay_years: Option<u32>,
}

impl Default for ProjectionPolicy {
    fn default() -> Self {
        Self {
            margin: MarginPolicy::Constant,
            fallback_operating_margin: dec!(0.10),
            debt_basis: DebtBasis::LongTermOnly,
            equity_weight_basis: EquityWeightBasis::BookEquity,
            reinvestment: ReinvestmentPolicy::FixedRate,
            high_growth_years: 0,
            decay_years: None,
        }
    }
}

/// Caller-supplied market assumptions and model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationAssumptions {
    pub risk_free_rate: Rate,
    /// Levered beta; falls back to the bundle's market beta when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<Decimal>,
    pub market_risk_premium: Rate,
    /// Pre-tax cost of debt; derived as interest_expense / total_debt when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_of_debt: Option<Rate>,
    /// Fixed discount rate replacing the WACC formula entirely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wacc_override: Option<Rate>,
    pub projection_years: u32,
    /// Fraction of NOPAT retained (FixedRate reinvestment)
    pub reinvestment_rate: Rate,
    /// Perpetual growth after the horizon; defaults to the risk-free rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_growth_rate: Option<Rate>,
    pub policy: ProjectionPolicy,
}

impl Default for ValuationAssumptions {
    fn default() -> Self {
        Self {
            risk_free_rate: dec!(0.04),
            beta: None,
            market_risk_premium: dec!(0.055),
            cost_of_debt: None,
            wacc_override: None,
            projection_years: 15,
            reinvestment_rate: dec!(0.20),
            terminal_growth_rate: None,
            policy: ProjectionPolicy::default(),
        }
    }
}

impl ValuationAssumptions {
    pub fn terminal_growth(&self) -> Rate {
        self.terminal_growth_rate.unwrap_or(self.risk_free_rate)
    }

    /// Range checks that do not depend on the bundle.
    pub fn validate(&self) -> DcfResult<()> {
        if self.projection_years == 0 {
            return Err(DcfError::InvalidAssumption {
                field: "projection_years".into(),
                reason: "At least one projection year is required".into(),
            });
        }
        if self.policy.high_growth_years > self.projection_years {
            return Err(DcfError::InvalidAssumption {
                field: "policy.high_growth_years".into(),
                reason: format!(
                    "High-growth years ({}) exceed the projection horizon ({})",
                    self.policy.high_growth_years, self.projection_years
                ),
            });
        }
        if self.policy.decay_years == Some(0) {
            return Err(DcfError::InvalidAssumption {
                field: "policy.decay_years".into(),
                reason: "Decay period must be at least one year".into(),
            });
        }
        if self.reinvestment_rate < Decimal::ZERO || self.reinvestment_rate > Decimal::ONE {
            return Err(DcfError::InvalidAssumption {
                field: "reinvestment_rate".into(),
                reason: "Reinvestment rate must be between 0 and 1".into(),
            });
        }
        if self.market_risk_premium < Decimal::ZERO {
            return Err(DcfError::InvalidAssumption {
                field: "market_risk_premium".into(),
                reason: "Market risk premium cannot be negative".into(),
            });
        }
        if let Some(kd) = self.cost_of_debt {
            if kd < Decimal::ZERO {
                return Err(DcfError::InvalidAssumption {
                    field: "cost_of_debt".into(),
                    reason: "Cost of debt cannot be negative".into(),
                });
            }
        }
        if let ReinvestmentPolicy::SalesToCapital { ratio: Some(r) } = self.policy.reinvestment {
            if r <= Decimal::ZERO {
                return Err(DcfError::InvalidAssumption {
                    field: "policy.reinvestment.ratio".into(),
                    reason: "Sales-to-capital ratio must be positive".into(),
                });
            }
        }
        Ok(())
    }
}
