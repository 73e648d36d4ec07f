use thiserror::Error;

#[derive(Debug, Error)]
pub enum DcfError {
    #[error("Missing required concept: no data for {metric} (tried {candidates:?})")]
    MissingRequiredConcept {
        metric: String,
        candidates: Vec<String>,
    },

    #[error("Insufficient data: {0}")]
    DataInsufficient(String),

    #[error("Invalid assumption: {field} — {reason}")]
    InvalidAssumption { field: String, reason: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Data source error: {0}")]
    Collaborator(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DcfError {
    fn from(e: serde_json::Error) -> Self {
        DcfError::Serialization(e.to_string())
    }
}
