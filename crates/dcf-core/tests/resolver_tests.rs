use chrono::NaiveDate;
use dcf_core::resolver::{
    resolve_inputs, resolve_inputs_with, InMemoryStatements, MarketSnapshot, Resolver,
    ResolverConfig, StatementFact, StaticMarketData,
};
use dcf_core::DcfError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Helpers
// ===========================================================================

fn annual(concept: &str, value: Decimal, year: i32) -> StatementFact {
    StatementFact {
        concept_id: concept.into(),
        value,
        unit: "USD".into(),
        start_date: NaiveDate::from_ymd_opt(year, 1, 1),
        end_date: NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
        filing_date: NaiveDate::from_ymd_opt(year + 1, 2, 15).unwrap(),
        form: "10-K".into(),
    }
}

fn instant(concept: &str, value: Decimal, year: i32) -> StatementFact {
    StatementFact {
        start_date: None,
        ..annual(concept, value, year)
    }
}

/// Three fiscal years of a company with every concept reported.
fn full_statements() -> Vec<StatementFact> {
    vec![
        annual("Revenues", dec!(1000), 2023),
        annual("Revenues", dec!(900), 2022),
        annual("Revenues", dec!(810), 2021),
        annual("OperatingIncomeLoss", dec!(200), 2023),
        annual("OperatingIncomeLoss", dec!(162), 2022),
        annual("IncomeTaxExpenseBenefit", dec!(42), 2023),
        annual(
            "IncomeLossFromContinuingOperationsBeforeIncomeTaxes",
            dec!(200),
            2023,
        ),
        instant("CashAndCashEquivalentsAtCarryingValue", dec!(150), 2023),
        instant("LongTermDebt", dec!(300), 2023),
        instant("ShortTermBorrowings", dec!(50), 2023),
        instant("StockholdersEquity", dec!(700), 2023),
        annual("InterestExpense", dec!(15), 2023),
        instant("CommonStockSharesOutstanding", dec!(100), 2023),
    ]
}

// ===========================================================================
// Bundle resolution
// ===========================================================================

#[test]
fn test_full_statements_resolve_without_defaults() {
    let bundle = resolve_inputs(&full_statements(), 5).unwrap();

    assert_eq!(bundle.revenues, vec![dec!(1000), dec!(900), dec!(810)]);
    assert_eq!(bundle.operating_margins, vec![dec!(0.2), dec!(0.18)]);
    assert_eq!(bundle.effective_tax_rate, dec!(0.21));
    assert_eq!(bundle.cash, dec!(150));
    assert_eq!(bundle.long_term_debt, dec!(300));
    assert_eq!(bundle.short_term_debt, dec!(50));
    assert_eq!(bundle.equity, dec!(700));
    assert_eq!(bundle.interest_expense, dec!(15));
    assert_eq!(bundle.shares_outstanding, dec!(100));
    assert!(bundle.defaulted.is_empty(), "{:?}", bundle.defaulted);

    // (1000-900)/900 and (900-810)/810 are both 1/9
    assert!((bundle.yoy_growth - dec!(0.111111)).abs() < dec!(0.000001));
}

#[test]
fn test_revenue_falls_back_to_later_candidate() {
    let facts: Vec<StatementFact> = full_statements()
        .into_iter()
        .map(|mut f| {
            if f.concept_id == "Revenues" {
                f.concept_id = "SalesRevenueNet".into();
            }
            f
        })
        .collect();
    let bundle = resolve_inputs(&facts, 5).unwrap();
    assert_eq!(bundle.revenues.len(), 3);
    assert_eq!(bundle.latest_revenue(), Some(dec!(1000)));
}

#[test]
fn test_years_limits_series_length() {
    let bundle = resolve_inputs(&full_statements(), 2).unwrap();
    assert_eq!(bundle.revenues, vec![dec!(1000), dec!(900)]);
}

#[test]
fn test_restated_period_keeps_latest_filing() {
    let mut facts = full_statements();
    let mut restated = annual("Revenues", dec!(920), 2022);
    restated.filing_date = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
    facts.push(restated);

    let bundle = resolve_inputs(&facts, 5).unwrap();
    assert_eq!(bundle.revenues, vec![dec!(1000), dec!(920), dec!(810)]);
}

#[test]
fn test_quarterly_rows_are_ignored_for_annual_form() {
    let mut facts = full_statements();
    let mut quarter = annual("Revenues", dec!(300), 2024);
    quarter.form = "10-Q".into();
    facts.push(quarter);

    let bundle = resolve_inputs(&facts, 5).unwrap();
    assert_eq!(bundle.latest_revenue(), Some(dec!(1000)));
}

#[test]
fn test_quarterly_form_can_be_configured() {
    let facts: Vec<StatementFact> = full_statements()
        .into_iter()
        .map(|mut f| {
            f.form = "10-Q".into();
            f
        })
        .collect();
    let config = ResolverConfig {
        form: "10-Q".into(),
        ..Default::default()
    };
    let bundle = resolve_inputs_with(&facts, &MarketSnapshot::default(), &config).unwrap();
    assert_eq!(bundle.revenues.len(), 3);
}

// ===========================================================================
// Failure semantics
// ===========================================================================

#[test]
fn test_single_revenue_period_is_insufficient() {
    let facts = vec![
        annual("Revenues", dec!(1000), 2023),
        instant("CommonStockSharesOutstanding", dec!(100), 2023),
    ];
    match resolve_inputs(&facts, 5) {
        Err(DcfError::DataInsufficient(_)) => {}
        other => panic!("Expected DataInsufficient, got {other:?}"),
    }
}

#[test]
fn test_missing_revenue_names_candidates() {
    let facts = vec![instant("CommonStockSharesOutstanding", dec!(100), 2023)];
    match resolve_inputs(&facts, 5) {
        Err(DcfError::MissingRequiredConcept { metric, candidates }) => {
            assert_eq!(metric, "revenue");
            assert!(candidates.iter().any(|c| c == "Revenues"));
        }
        other => panic!("Expected MissingRequiredConcept, got {other:?}"),
    }
}

#[test]
fn test_missing_shares_is_required() {
    let facts: Vec<StatementFact> = full_statements()
        .into_iter()
        .filter(|f| f.concept_id != "CommonStockSharesOutstanding")
        .collect();
    match resolve_inputs(&facts, 5) {
        Err(DcfError::MissingRequiredConcept { metric, .. }) => {
            assert_eq!(metric, "shares_outstanding")
        }
        other => panic!("Expected MissingRequiredConcept, got {other:?}"),
    }
}

#[test]
fn test_missing_debt_defaults_to_zero() {
    let facts: Vec<StatementFact> = full_statements()
        .into_iter()
        .filter(|f| f.concept_id != "LongTermDebt")
        .collect();
    let bundle = resolve_inputs(&facts, 5).unwrap();
    assert_eq!(bundle.long_term_debt, Decimal::ZERO);
    assert_eq!(bundle.defaulted, vec!["long_term_debt".to_string()]);
}

#[test]
fn test_negative_tax_is_floored() {
    let facts: Vec<StatementFact> = full_statements()
        .into_iter()
        .map(|mut f| {
            if f.concept_id == "IncomeTaxExpenseBenefit" {
                f.value = dec!(-10);
            }
            f
        })
        .collect();
    let bundle = resolve_inputs(&facts, 5).unwrap();
    assert_eq!(bundle.effective_tax_rate, dec!(0.00001));
}

// ===========================================================================
// Collaborators
// ===========================================================================

#[test]
fn test_resolver_uses_injected_sources() {
    let mut statements = InMemoryStatements::new();
    statements.insert("ACME", full_statements());
    let mut market = StaticMarketData::new();
    market.insert(
        "ACME",
        MarketSnapshot {
            beta: Some(dec!(1.2)),
            shares_outstanding: Some(dec!(120)),
            current_price: Some(dec!(9.5)),
        },
    );

    let resolver = Resolver::new(statements, market, ResolverConfig::default());
    let bundle = resolver.resolve("ACME").unwrap();
    assert_eq!(bundle.shares_outstanding, dec!(120));
    assert_eq!(bundle.beta, Some(dec!(1.2)));
    assert_eq!(bundle.current_price, Some(dec!(9.5)));
}

#[test]
fn test_resolver_propagates_source_errors() {
    let resolver = Resolver::new(
        InMemoryStatements::new(),
        StaticMarketData::new(),
        ResolverConfig::default(),
    );
    assert!(matches!(
        resolver.resolve("UNKNOWN"),
        Err(DcfError::Collaborator(_))
    ));
}

#[test]
fn test_bundle_round_trips_through_json() {
    let bundle = resolve_inputs(&full_statements(), 5).unwrap();
    let json = serde_json::to_string(&bundle).unwrap();
    let back: dcf_core::resolver::FinancialInputBundle = serde_json::from_str(&json).unwrap();
    assert_eq!(bundle, back);
}
