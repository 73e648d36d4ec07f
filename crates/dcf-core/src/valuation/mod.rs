pub mod assumptions;
pub mod dcf;
pub mod growth;
pub mod wacc;

pub use assumptions::{
    EquityWeightBasis, MarginPolicy, ProjectionPolicy, ReinvestmentPolicy, ValuationAssumptions,
};
pub use dcf::{compute_valuation, ProjectedYear, ProjectionResult};
pub use growth::growth_schedule;
pub use wacc::{calculate_wacc, resolve_discount_rate, WaccBreakdown};
