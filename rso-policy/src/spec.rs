//! Serializable policy specifications and their resolution into [`Policy`].

use crate::error::{PolicyError, Result};
use crate::log_exp::{build_log_exp_v1, build_log_exp_v2, LogExpV1Params, LogExpV2Params};
use crate::lookup::{SeasonalLookup, SeasonalTable, StaticLookup, DEFAULT_RESOLUTION};
use crate::piecewise::build_piecewise_linear;
use crate::policy::Policy;
use crate::rule_curve::{build_rule_curve, BandControlPoints};
use chrono::NaiveDate;
use rso_utils::series::Series;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn default_resolution() -> f64 {
    DEFAULT_RESOLUTION
}

/// Curve parameters plus the grid they are sampled on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tabulated<P> {
    #[serde(flatten)]
    pub params: P,
    #[serde(default = "default_resolution")]
    pub resolution: f64,
}

/// A human-authored policy, as found in a run configuration.
///
/// ```json
/// { "type": "piecewise_linear", "points": [[0.0, 2.0], [0.4, 5.0], [1.0, 10.0]] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicySpec {
    #[default]
    None,
    /// A flow for every time step.
    Schedule { values: Vec<f64> },
    PiecewiseLinear {
        points: Vec<(f64, f64)>,
        #[serde(default = "default_resolution")]
        resolution: f64,
    },
    LogExpV1(Tabulated<LogExpV1Params>),
    LogExpV2(Tabulated<LogExpV2Params>),
    RuleCurve {
        curves: BandControlPoints,
        rules: BandControlPoints,
        #[serde(default = "default_resolution")]
        resolution: f64,
    },
}

impl PolicySpec {
    /// Whether resolving this spec needs the calendar dates of the run.
    pub fn is_seasonal(&self) -> bool {
        matches!(self, PolicySpec::RuleCurve { .. })
    }

    /// Build the storage-fraction lookup for non-seasonal lookup specs.
    pub fn static_lookup(&self) -> Option<Result<StaticLookup>> {
        match self {
            PolicySpec::PiecewiseLinear { points, resolution } => {
                Some(build_piecewise_linear(points, *resolution))
            }
            PolicySpec::LogExpV1(spec) => Some(
                build_log_exp_v1(spec.params)
                    .and_then(|curve| StaticLookup::tabulate(&curve, spec.resolution)),
            ),
            PolicySpec::LogExpV2(spec) => Some(
                build_log_exp_v2(spec.params)
                    .and_then(|curve| StaticLookup::tabulate(&curve, spec.resolution)),
            ),
            PolicySpec::None | PolicySpec::Schedule { .. } | PolicySpec::RuleCurve { .. } => None,
        }
    }

    /// Build the day-of-year table for seasonal specs.
    pub fn seasonal_table(&self) -> Option<Result<SeasonalTable>> {
        match self {
            PolicySpec::RuleCurve {
                curves,
                rules,
                resolution,
            } => Some(
                build_rule_curve(curves, rules)
                    .and_then(|table| SeasonalTable::from_rule_curve(&table, *resolution)),
            ),
            _ => None,
        }
    }

    /// Resolve into a policy the engine can run. Seasonal specs are bound to
    /// `dates`, one per simulation step.
    pub fn resolve(&self, dates: Option<&[NaiveDate]>) -> Result<Policy> {
        if let PolicySpec::Schedule { values } = self {
            return Ok(Policy::ExplicitSeries(Series::Steps(values.clone())));
        }
        if let Some(lookup) = self.static_lookup() {
            return lookup.map(Policy::StaticLookup);
        }
        if let Some(table) = self.seasonal_table() {
            let dates = dates.ok_or_else(|| {
                PolicyError::InvalidPolicySpec(
                    "a rule curve policy needs the simulation dates".to_string(),
                )
            })?;
            let table = Arc::new(table?);
            return Ok(Policy::SeasonalLookup(SeasonalLookup::for_dates(table, dates)));
        }
        Ok(Policy::None)
    }
}
