use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Shares};

/// A single period-tagged fact from a filing, in the normalized shape the
/// resolver consumes regardless of where it was sourced from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementFact {
    /// Accounting concept identifier (e.g. `Revenues`)
    pub concept_id: String,
    pub value: Money,
    /// Unit of measure (`USD`, `shares`, `USD/shares`)
    #[serde(default)]
    pub unit: String,
    /// Period start; `None` for instant (balance-sheet) facts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
    pub filing_date: NaiveDate,
    /// Filing form (`10-K`, `10-Q`, ...)
    pub form: String,
}

impl StatementFact {
    /// Length of the reported period in days; instant facts have length zero.
    pub fn period_days(&self) -> i64 {
        self.start_date
            .map(|start| (self.end_date - start).num_days())
            .unwrap_or(0)
    }
}

/// One point of a resolved series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub end_date: NaiveDate,
    pub value: Money,
}

/// A series resolved from the first matching concept, most-recent-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptSeries {
    /// The concept that produced the data
    pub concept: String,
    pub points: Vec<SeriesPoint>,
}

impl ConceptSeries {
    pub fn values(&self) -> Vec<Money> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.first()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Scalars supplied by the market-data collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSnapshot {
    /// Levered equity beta
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<Decimal>,
    /// Latest known share count; preferred over filing data when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares_outstanding: Option<Shares>,
    /// Last traded price, only used for comparison with the computed value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Money>,
}
