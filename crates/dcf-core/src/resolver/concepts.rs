use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Rate;

// Fallback lists, highest priority first. Different filers (and different
// taxonomy years) tag the same economic quantity under different names.

const REVENUE: &[&str] = &[
    "Revenues",
    "SalesRevenueNet",
    "RevenueFromContractWithCustomerExcludingAssessedTax",
];

const OPERATING_INCOME: &[&str] = &[
    "OperatingIncomeLoss",
    "OperatingIncome",
    "IncomeLossFromContinuingOperationsBeforeIncomeTaxes",
];

const PRETAX_INCOME: &[&str] = &[
    "IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
    "IncomeLossFromContinuingOperationsBeforeIncomeTaxesMinorityInterestAndIncomeLossFromEquityMethodInvestments",
    "IncomeLossFromContinuingOperationsBeforeIncomeTaxes",
];

const INCOME_TAX_EXPENSE: &[&str] = &["IncomeTaxExpenseBenefit", "IncomeTaxesPaid"];

const CASH: &[&str] = &["Cash", "CashAndCashEquivalentsAtCarryingValue"];

const LONG_TERM_DEBT: &[&str] = &[
    "LongTermDebt",
    "LongTermDebtAndCapitalLeaseObligations",
    "LongTermDebtNoncurrent",
];

const SHORT_TERM_DEBT: &[&str] = &["ShortTermBorrowings", "LongTermDebtCurrent", "DebtCurrent"];

const EQUITY: &[&str] = &[
    "StockholdersEquity",
    "StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
];

const INTEREST_EXPENSE: &[&str] = &["InterestExpense", "InterestExpenseDebt"];

const SHARES_OUTSTANDING: &[&str] = &[
    "EntityCommonStockSharesOutstanding",
    "CommonStockSharesOutstanding",
    "WeightedAverageNumberOfDilutedSharesOutstanding",
    "CommonStockSharesIssued",
];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Ordered concept fallback lists for every metric the resolver reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConceptMap {
    pub revenue: Vec<String>,
    pub operating_income: Vec<String>,
    pub pretax_income: Vec<String>,
    pub income_tax_expense: Vec<String>,
    pub cash: Vec<String>,
    pub long_term_debt: Vec<String>,
    pub short_term_debt: Vec<String>,
    pub equity: Vec<String>,
    pub interest_expense: Vec<String>,
    pub shares_outstanding: Vec<String>,
}

impl Default for ConceptMap {
    fn default() -> Self {
        Self {
            revenue: owned(REVENUE),
            operating_income: owned(OPERATING_INCOME),
            pretax_income: owned(PRETAX_INCOME),
            income_tax_expense: owned(INCOME_TAX_EXPENSE),
            cash: owned(CASH),
            long_term_debt: owned(LONG_TERM_DEBT),
            short_term_debt: owned(SHORT_TERM_DEBT),
            equity: owned(EQUITY),
            interest_expense: owned(INTEREST_EXPENSE),
            shares_outstanding: owned(SHARES_OUTSTANDING),
        }
    }
}

/// Resolver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Filing form the statement rows are filtered to
    pub form: String,
    /// Number of most-recent periods to read for series metrics
    pub years: usize,
    pub concepts: ConceptMap,
    /// Tax rate used when pretax income is zero or unavailable
    pub default_tax_rate: Rate,
    /// Substituted for a computed tax rate <= 0. Kept above zero so the rate
    /// stays usable as a multiplicative factor.
    pub tax_rate_floor: Rate,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            form: "10-K".to_string(),
            years: 5,
            concepts: ConceptMap::default(),
            default_tax_rate: dec!(0.21),
            tax_rate_floor: dec!(0.00001),
        }
    }
}

impl ResolverConfig {
    pub fn with_years(years: usize) -> Self {
        Self {
            years,
            ..Self::default()
        }
    }
}
