use clap::Args;
use serde_json::Value;

use dcf_core::resolver::{
    resolve_inputs_with, FinancialInputBundle, MarketSnapshot, ResolverConfig, StatementFact,
};
use dcf_core::with_metadata;

use crate::input;

/// Where statement facts and market data come from.
#[derive(Args, Debug, Default)]
pub struct FactsArgs {
    /// Path to a JSON array of statement facts (stdin if omitted)
    #[arg(long)]
    pub facts: Option<String>,

    /// Path to a JSON market snapshot (beta, shares_outstanding, current_price)
    #[arg(long)]
    pub market: Option<String>,

    /// Resolver configuration file (YAML or JSON): form, years, concept lists
    #[arg(long)]
    pub resolver_config: Option<String>,

    /// Filing form to read (e.g. 10-K, 10-Q)
    #[arg(long)]
    pub form: Option<String>,

    /// Number of most-recent periods to read
    #[arg(long)]
    pub years: Option<usize>,
}

/// Arguments for input resolution
#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub source: FactsArgs,
}

impl FactsArgs {
    pub fn resolver_config(&self) -> Result<ResolverConfig, Box<dyn std::error::Error>> {
        let mut config: ResolverConfig = match self.resolver_config {
            Some(ref path) => input::file::read_config(path)?,
            None => ResolverConfig::default(),
        };
        if let Some(ref form) = self.form {
            config.form = form.clone();
        }
        if let Some(years) = self.years {
            config.years = years;
        }
        Ok(config)
    }

    pub fn market(&self) -> Result<MarketSnapshot, Box<dyn std::error::Error>> {
        match self.market {
            Some(ref path) => input::file::read_json(path),
            None => Ok(MarketSnapshot::default()),
        }
    }
}

/// Read statement facts from `--facts`, or from stdin when none was given.
pub fn load_facts(args: &FactsArgs) -> Result<Vec<StatementFact>, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.facts {
        input::file::read_json(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err("--facts is required (or pipe a JSON array of facts on stdin)".into())
    }
}

/// Resolve facts into a bundle using the arguments' market data and config.
pub fn resolve_bundle(
    args: &FactsArgs,
    facts: &[StatementFact],
) -> Result<(FinancialInputBundle, ResolverConfig), Box<dyn std::error::Error>> {
    let config = args.resolver_config()?;
    let market = args.market()?;
    let bundle = resolve_inputs_with(facts, &market, &config)?;
    Ok((bundle, config))
}

pub fn run_resolve(args: ResolveArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let facts = load_facts(&args.source)?;
    let (bundle, config) = resolve_bundle(&args.source, &facts)?;

    let warnings: Vec<String> = bundle
        .defaulted
        .iter()
        .map(|field| format!("'{field}' was not reported and uses its default"))
        .collect();

    let output = with_metadata(
        "Concept fallback resolution of statement facts",
        &config,
        warnings,
        bundle,
    );
    Ok(serde_json::to_value(output)?)
}
