//! SEC `companyfacts` document adapter.
//!
//! Flattens the nested `facts -> taxonomy -> concept -> units -> unit -> [entry]`
//! layout into the [`StatementFact`] rows the resolver consumes. Fetching the
//! document is left to the caller.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::resolver::StatementFact;
use crate::DcfResult;

#[derive(Debug, Deserialize)]
pub struct CompanyFacts {
    #[serde(default, rename = "entityName")]
    pub entity_name: Option<String>,
    #[serde(default)]
    pub facts: BTreeMap<String, BTreeMap<String, ConceptFacts>>,
}

#[derive(Debug, Deserialize)]
pub struct ConceptFacts {
    #[serde(default)]
    pub units: BTreeMap<String, Vec<RawFact>>,
}

/// One entry as it appears in the document. Kept loose so a single bad
/// entry does not reject the whole filing history.
#[derive(Debug, Deserialize)]
pub struct RawFact {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub val: serde_json::Value,
    #[serde(default)]
    pub filed: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
}

/// Parse a `companyfacts` JSON document into statement facts.
pub fn parse_company_facts(json: &str) -> DcfResult<Vec<StatementFact>> {
    let doc: CompanyFacts = serde_json::from_str(json)?;
    Ok(doc.into_statement_facts())
}

impl CompanyFacts {
    /// Flatten every taxonomy into facts. Output order follows taxonomy,
    /// concept and unit names, then document order.
    pub fn into_statement_facts(self) -> Vec<StatementFact> {
        let mut out = Vec::new();
        let mut skipped = 0usize;

        for (taxonomy, concepts) in self.facts {
            for (concept, details) in concepts {
                for (unit, entries) in details.units {
                    for raw in entries {
                        match convert(&concept, &unit, raw) {
                            Some(fact) => out.push(fact),
                            None => skipped += 1,
                        }
                    }
                }
            }
            debug!(%taxonomy, "flattened taxonomy");
        }

        if skipped > 0 {
            debug!(skipped, kept = out.len(), "skipped companyfacts entries with unusable fields");
        }
        out
    }
}

fn convert(concept: &str, unit: &str, raw: RawFact) -> Option<StatementFact> {
    let end_date = parse_date(raw.end.as_deref()?)?;
    let filing_date = parse_date(raw.filed.as_deref()?)?;
    let start_date = match raw.start.as_deref() {
        Some(s) => Some(parse_date(s)?),
        None => None,
    };
    let value = parse_value(&raw.val)?;

    Some(StatementFact {
        concept_id: concept.to_string(),
        value,
        unit: unit.to_string(),
        start_date,
        end_date,
        filing_date,
        form: raw.form.unwrap_or_else(|| "UNKNOWN".to_string()),
    })
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_value(v: &serde_json::Value) -> Option<Decimal> {
    let text = match v {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}
