//! Financial Input Resolver.
//!
//! Turns period-tagged statement facts into a [`FinancialInputBundle`]:
//! concept fallback resolution, then ratio derivation. No I/O happens here;
//! fetching is delegated to [`StatementSource`] / [`MarketDataSource`]
//! implementations injected into a [`Resolver`].

pub mod bundle;
pub mod concepts;
pub mod facts;
pub mod ratios;
pub mod series;
pub mod sources;

pub use bundle::{resolve_inputs, resolve_inputs_with, FinancialInputBundle};
pub use concepts::{ConceptMap, ResolverConfig};
pub use facts::{ConceptSeries, MarketSnapshot, SeriesPoint, StatementFact};
pub use ratios::DebtBasis;
pub use series::{latest_balance_sheet_value, latest_fact, resolve_concept};
pub use sources::{
    InMemoryStatements, MarketDataSource, Resolver, StatementSource, StaticMarketData,
};
