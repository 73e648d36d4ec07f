pub mod edgar;
pub mod resolve;
pub mod valuation;
