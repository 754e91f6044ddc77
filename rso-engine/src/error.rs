/// Error types for the simulation engine
use rso_policy::PolicyError;
use thiserror::Error;

/// Main error type for simulation runs. Every variant is raised before the
/// first step is simulated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Reservoir limits are inconsistent
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A driver or policy series does not fit the run's `[T, M]` shape
    #[error(
        "Shape mismatch for {series}: expected [{}, {}], found [{}, {}]",
        expected.0,
        expected.1,
        found.0,
        found.1
    )]
    ShapeMismatch {
        series: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// No scenario driver carries a time axis
    #[error("No scenario series carries a time axis; cannot infer the number of steps")]
    MissingTimeAxis,

    /// The policy cannot be evaluated for this run
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Type alias for Results using SimulationError
pub type Result<T> = std::result::Result<T, SimulationError>;
