/// Error types for policy construction
use thiserror::Error;

/// Main error type for the policy builder
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    /// Control points do not describe a well-defined function
    #[error("Invalid policy spec: {0}")]
    InvalidPolicySpec(String),

    /// A parametric curve parameter is out of its admissible range
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A control-point date could not be parsed
    #[error("Failed to parse year date: {0}")]
    DateParse(String),
}

/// Type alias for Results using PolicyError
pub type Result<T> = std::result::Result<T, PolicyError>;
