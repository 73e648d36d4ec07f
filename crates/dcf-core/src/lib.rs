pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "resolver")]
pub mod resolver;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "edgar")]
pub mod edgar;

pub use error::DcfError;
pub use types::*;

/// Standard result type for all dcf-core operations
pub type DcfResult<T> = Result<T, DcfError>;
