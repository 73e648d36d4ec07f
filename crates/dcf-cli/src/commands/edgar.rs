use clap::Args;
use serde_json::Value;

use dcf_core::edgar::CompanyFacts;
use dcf_core::with_metadata;

use crate::input;

/// Arguments for companyfacts flattening
#[derive(Args)]
pub struct EdgarArgs {
    /// Path to an SEC companyfacts JSON document (stdin if omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Keep only facts from this filing form (e.g. 10-K)
    #[arg(long)]
    pub form: Option<String>,

    /// Keep only these concepts (repeatable)
    #[arg(long = "concept")]
    pub concepts: Vec<String>,
}

pub fn run_edgar(args: EdgarArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc: CompanyFacts = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input is required (or pipe a companyfacts document on stdin)".into());
    };

    let entity = doc.entity_name.clone().unwrap_or_default();
    let facts: Vec<_> = doc
        .into_statement_facts()
        .into_iter()
        .filter(|f| args.form.as_ref().map_or(true, |form| &f.form == form))
        .filter(|f| args.concepts.is_empty() || args.concepts.contains(&f.concept_id))
        .collect();

    let filters = serde_json::json!({
        "entity": entity,
        "form": args.form,
        "concepts": args.concepts,
    });
    let output = with_metadata("SEC companyfacts flattening", &filters, Vec::new(), facts);
    Ok(serde_json::to_value(output)?)
}
