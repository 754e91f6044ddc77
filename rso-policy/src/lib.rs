//! Reservoir operating policy construction.
//!
//! Turns sparse, human-specified control points into dense lookups over the
//! storage-fraction axis (and, for rule curves, the day-of-year axis) that
//! the simulation engine evaluates every step.

pub mod error;
pub mod log_exp;
pub mod lookup;
pub mod piecewise;
pub mod policy;
pub mod rule_curve;
pub mod spec;

pub use error::{PolicyError, Result};
pub use log_exp::{
    build_log_exp_v1, build_log_exp_v2, LogExpV1, LogExpV1Params, LogExpV2, LogExpV2Params,
};
pub use lookup::{PolicyEvaluator, SeasonalLookup, SeasonalTable, StaticLookup, DEFAULT_RESOLUTION};
pub use piecewise::{build_piecewise_linear, PiecewiseLinear};
pub use policy::Policy;
pub use rule_curve::{build_rule_curve, BandControlPoints, RuleCurveTable};
pub use spec::PolicySpec;
