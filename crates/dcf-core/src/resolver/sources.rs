use std::collections::HashMap;

use tracing::info;

use crate::error::DcfError;
use crate::DcfResult;

use super::bundle::{resolve_inputs_with, FinancialInputBundle};
use super::concepts::ResolverConfig;
use super::facts::{MarketSnapshot, StatementFact};

/// Supplies normalized statement rows for a company.
pub trait StatementSource {
    fn statement_facts(&self, company: &str) -> DcfResult<Vec<StatementFact>>;
}

/// Supplies market scalars (beta, share count, price) for a company.
pub trait MarketDataSource {
    fn market_snapshot(&self, company: &str) -> DcfResult<MarketSnapshot>;
}

/// Statement rows held in memory, keyed by company identifier.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatements {
    facts: HashMap<String, Vec<StatementFact>>,
}

impl InMemoryStatements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, company: impl Into<String>, facts: Vec<StatementFact>) {
        self.facts.insert(company.into(), facts);
    }
}

impl StatementSource for InMemoryStatements {
    fn statement_facts(&self, company: &str) -> DcfResult<Vec<StatementFact>> {
        self.facts
            .get(company)
            .cloned()
            .ok_or_else(|| DcfError::Collaborator(format!("No statements for '{company}'")))
    }
}

/// Fixed market snapshots keyed by company. Unknown companies get an empty
/// snapshot rather than an error, since market data is optional.
#[derive(Debug, Clone, Default)]
pub struct StaticMarketData {
    snapshots: HashMap<String, MarketSnapshot>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, company: impl Into<String>, snapshot: MarketSnapshot) {
        self.snapshots.insert(company.into(), snapshot);
    }
}

impl MarketDataSource for StaticMarketData {
    fn market_snapshot(&self, company: &str) -> DcfResult<MarketSnapshot> {
        Ok(self.snapshots.get(company).cloned().unwrap_or_default())
    }
}

/// Builds input bundles through injected data collaborators.
#[derive(Debug, Clone)]
pub struct Resolver<S, M> {
    statements: S,
    market: M,
    config: ResolverConfig,
}

impl<S: StatementSource, M: MarketDataSource> Resolver<S, M> {
    pub fn new(statements: S, market: M, config: ResolverConfig) -> Self {
        Self {
            statements,
            market,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn resolve(&self, company: &str) -> DcfResult<FinancialInputBundle> {
        let facts = self.statements.statement_facts(company)?;
        let snapshot = self.market.market_snapshot(company)?;
        info!(company, facts = facts.len(), "resolving valuation inputs");
        resolve_inputs_with(&facts, &snapshot, &self.config)
    }
}
