//! Performance measures computed from a simulation trace.

use crate::error::{Result, SimulationError};
use crate::trace::SimulationTrace;
use rso_utils::series::{Ensemble, Series};

/// Sum of squared supply shortfalls, `Σ max(0, d − r)²`.
pub fn total_squared_deficit(demand: &[f64], release: &[f64]) -> f64 {
    demand
        .iter()
        .zip(release)
        .map(|(d, r)| {
            let shortfall = (d - r).max(0.0);
            shortfall * shortfall
        })
        .sum()
}

/// Sum of supply shortfalls, `Σ max(0, d − r)`.
pub fn total_deficit(demand: &[f64], release: &[f64]) -> f64 {
    demand.iter().zip(release).map(|(d, r)| (d - r).max(0.0)).sum()
}

/// Total volume by which storage fell short of `target`.
pub fn storage_violation(target: &[f64], storage: &[f64]) -> f64 {
    target.iter().zip(storage).map(|(g, s)| (g - s).max(0.0)).sum()
}

/// Mean over ensemble members; NaN for an empty ensemble.
pub fn ensemble_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Per-member objectives of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Objectives {
    pub total_squared_deficit: Vec<f64>,
    pub total_deficit: Vec<f64>,
    /// Only present when a storage target was given.
    pub storage_violation: Option<Vec<f64>>,
}

impl Objectives {
    /// Score `trace` against `demand` and, optionally, a storage target
    /// applied to all `T + 1` storage values.
    pub fn evaluate(
        trace: &SimulationTrace,
        demand: &Series,
        storage_target: Option<&Series>,
    ) -> Result<Self> {
        let (steps, members) = (trace.steps(), trace.members());
        let demand = dense("demand", demand, steps, members)?;
        let per_member = |f: fn(&[f64], &[f64]) -> f64, a: &Ensemble, b: &Ensemble| {
            (0..members).map(|m| f(a.member(m), b.member(m))).collect::<Vec<_>>()
        };
        let storage_violation = match storage_target {
            Some(target) => {
                let target = dense("storage_target", target, steps + 1, members)?;
                Some(per_member(storage_violation, &target, &trace.storage))
            }
            None => None,
        };
        Ok(Objectives {
            total_squared_deficit: per_member(
                total_squared_deficit,
                &demand,
                &trace.regulated_release,
            ),
            total_deficit: per_member(total_deficit, &demand, &trace.regulated_release),
            storage_violation,
        })
    }

    pub fn mean_squared_deficit(&self) -> f64 {
        ensemble_mean(&self.total_squared_deficit)
    }

    pub fn mean_deficit(&self) -> f64 {
        ensemble_mean(&self.total_deficit)
    }

    pub fn mean_storage_violation(&self) -> Option<f64> {
        self.storage_violation.as_deref().map(ensemble_mean)
    }
}

fn dense(name: &str, series: &Series, steps: usize, members: usize) -> Result<Ensemble> {
    series
        .broadcast(steps, members)
        .map_err(|e| SimulationError::ShapeMismatch {
            series: name.to_string(),
            expected: e.expected,
            found: e.found,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReservoirConfig;
    use crate::scenario::Scenario;
    use crate::simulate::simulate_with_policy;
    use rso_policy::Policy;

    #[test]
    fn test_deficits() {
        let demand = [9.0, 9.0, 9.0];
        let release = [9.0, 7.0, 10.0];
        assert_eq!(total_squared_deficit(&demand, &release), 4.0);
        assert_eq!(total_deficit(&demand, &release), 2.0);
        assert_eq!(storage_violation(&[10.0, 10.0], &[12.0, 7.5]), 2.5);
        assert_eq!(ensemble_mean(&[1.0, 2.0, 6.0]), 3.0);
        assert!(ensemble_mean(&[]).is_nan());
    }

    #[test]
    fn test_objectives_for_throttled_run() {
        let scenario = Scenario::new(vec![10.0; 10], 1.0, 9.0, 2.0);
        let config = ReservoirConfig::new(5.0, 100.0, 20.0);
        let trace = simulate_with_policy(&scenario, &config, Policy::None).unwrap();
        // releases end 8, 7, 7 against a demand of 9
        let objectives =
            Objectives::evaluate(&trace, &scenario.demand, Some(&Series::Constant(10.0))).unwrap();
        assert_eq!(objectives.total_squared_deficit, vec![9.0]);
        assert_eq!(objectives.total_deficit, vec![5.0]);
        assert_eq!(objectives.storage_violation, Some(vec![2.0 + 4.0 + 5.0 + 5.0 + 5.0]));
        assert_eq!(objectives.mean_squared_deficit(), 9.0);

        let wrong = Series::Steps(vec![10.0; 10]);
        assert!(Objectives::evaluate(&trace, &scenario.demand, Some(&wrong)).is_err());
    }
}
