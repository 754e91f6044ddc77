use crate::error::{Result, SimulationError};
use rso_policy::Policy;
use rso_utils::series::Series;

/// The exogenous drivers of one simulation.
///
/// Each driver may be a constant, a `[T]` trace shared by every member, or a
/// `[T, M]` ensemble. Values are taken as given: negative or NaN inputs are
/// the caller's responsibility and propagate through the arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Natural inflow volume per step.
    pub inflow: Series,
    /// Evaporation depth per step; multiplied by the surface area.
    pub evaporation: Series,
    /// Water demand per step; the release when no release policy is set.
    pub demand: Series,
    /// Required environmental compensation flow per step.
    pub env_requirement: Series,
}

impl Scenario {
    pub fn new(
        inflow: impl Into<Series>,
        evaporation: impl Into<Series>,
        demand: impl Into<Series>,
        env_requirement: impl Into<Series>,
    ) -> Self {
        Scenario {
            inflow: inflow.into(),
            evaporation: evaporation.into(),
            demand: demand.into(),
            env_requirement: env_requirement.into(),
        }
    }

    pub(crate) fn named_series(&self) -> [(&'static str, &Series); 4] {
        [
            ("inflow", &self.inflow),
            ("evaporation", &self.evaporation),
            ("demand", &self.demand),
            ("env_requirement", &self.env_requirement),
        ]
    }

    /// The run's `[T, M]` shape, inferred from every driver that carries an
    /// axis. Drivers without a member axis are shared by all members.
    pub fn dimensions(&self) -> Result<(usize, usize)> {
        let series = self.named_series();
        let steps = series
            .iter()
            .find_map(|(_, s)| s.steps())
            .ok_or(SimulationError::MissingTimeAxis)?;
        let members = series.iter().find_map(|(_, s)| s.members()).unwrap_or(1);
        for (name, s) in series {
            let found_steps = s.steps().unwrap_or(steps);
            let found_members = s.members().unwrap_or(members);
            if found_steps != steps || found_members != members {
                return Err(SimulationError::ShapeMismatch {
                    series: name.to_string(),
                    expected: (steps, members),
                    found: (found_steps, found_members),
                });
            }
        }
        Ok((steps, members))
    }
}

/// Policies for the two operator-controlled channels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Regulation {
    /// Regulated release; [`Policy::None`] releases the demand.
    pub releases: Policy,
    /// Regulated inflow, e.g. pumped transfers; [`Policy::None`] means none.
    pub inflows: Policy,
}

impl Regulation {
    /// Only the release channel is regulated.
    pub fn releases(policy: impl Into<Policy>) -> Self {
        Regulation {
            releases: policy.into(),
            inflows: Policy::None,
        }
    }

    /// The same policy drives both the release and the inflow channel.
    pub fn combined(policy: impl Into<Policy>) -> Self {
        let policy = policy.into();
        Regulation {
            releases: policy.clone(),
            inflows: policy,
        }
    }
}
