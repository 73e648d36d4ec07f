use std::cmp::Ordering;

use rust_decimal::Decimal;
use tracing::debug;

use crate::types::Money;

use super::facts::{ConceptSeries, SeriesPoint, StatementFact};

/// Resolve a series from the first candidate concept that has data.
///
/// Candidates are tried in priority order. For the first concept with at least
/// one row of the requested `form`, rows are ordered by period end date
/// (newest first), collapsed to one value per end date, and truncated to
/// `years` points. Restated periods keep the most recently filed fact; if two
/// facts share both end date and filing date the longer period wins, so a
/// full-year figure beats the fourth-quarter figure reported in the same
/// annual filing.
///
/// Returns `None` when no candidate matches. That is a signal for the caller
/// to fall back to a default, not an error.
pub fn resolve_concept(
    candidates: &[String],
    facts: &[StatementFact],
    form: &str,
    years: usize,
) -> Option<ConceptSeries> {
    for concept in candidates {
        let mut rows: Vec<&StatementFact> = facts
            .iter()
            .filter(|f| f.concept_id == *concept && f.form == form)
            .collect();
        if rows.is_empty() {
            continue;
        }

        rows.sort_by(|a, b| {
            b.end_date
                .cmp(&a.end_date)
                .then_with(|| b.filing_date.cmp(&a.filing_date))
                .then_with(|| b.period_days().cmp(&a.period_days()))
        });
        rows.dedup_by(|later, kept| later.end_date == kept.end_date);

        let points: Vec<SeriesPoint> = rows
            .into_iter()
            .take(years)
            .map(|f| SeriesPoint {
                end_date: f.end_date,
                value: f.value,
            })
            .collect();

        debug!(concept = %concept, periods = points.len(), "resolved series");
        return Some(ConceptSeries {
            concept: concept.clone(),
            points,
        });
    }
    None
}

/// The most recently filed fact for the first candidate concept that has data.
///
/// Ordered by filing date (then period end date), newest first, since a
/// balance-sheet snapshot is "latest known" rather than "latest period".
pub fn latest_fact<'a>(
    candidates: &[String],
    facts: &'a [StatementFact],
    form: &str,
) -> Option<&'a StatementFact> {
    candidates.iter().find_map(|concept| {
        facts
            .iter()
            .filter(|f| f.concept_id == *concept && f.form == form)
            .max_by(|a, b| compare_recency(a, b))
    })
}

/// Latest balance-sheet value with concept fallbacks, defaulting to zero.
pub fn latest_balance_sheet_value(
    candidates: &[String],
    facts: &[StatementFact],
    form: &str,
) -> Money {
    latest_fact(candidates, facts, form)
        .map(|f| f.value)
        .unwrap_or(Decimal::ZERO)
}

fn compare_recency(a: &StatementFact, b: &StatementFact) -> Ordering {
    a.filing_date
        .cmp(&b.filing_date)
        .then_with(|| a.end_date.cmp(&b.end_date))
}
