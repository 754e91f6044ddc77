//! Reservoir storage simulation.
//!
//! A single reservoir is stepped through a scenario of inflow, evaporation,
//! demand and environmental requirements, for one or many ensemble members,
//! under an optional operating policy from [`rso_policy`].
//!
//! ```no_run
//! use rso_engine::{simulate, Regulation, ReservoirConfig, Scenario, SimulationOptions};
//!
//! let scenario = Scenario::new(vec![10.0; 10], 1.0, 9.0, 2.0);
//! let config = ReservoirConfig::new(5.0, 100.0, 20.0);
//! let options = SimulationOptions::default();
//! let trace = simulate(&scenario, &config, &Regulation::default(), &options)?;
//! assert_eq!(trace.storage.steps(), 11);
//! # Ok::<(), rso_engine::SimulationError>(())
//! ```

pub mod config;
pub mod error;
pub mod mass_balance;
pub mod objectives;
pub mod scenario;
pub mod simulate;
pub mod trace;

pub use config::{ExecutionMode, ReservoirConfig, SimulationOptions, DEFAULT_SURFACE_AREA};
pub use error::{Result, SimulationError};
pub use objectives::Objectives;
pub use scenario::{Regulation, Scenario};
pub use simulate::{simulate, simulate_with_policy};
pub use trace::SimulationTrace;
