//! The reservoir mass balance.
//!
//! Storage at the start of the next step is
//!
//! ```text
//! s(t+1) = s(t) + I(t) + Qreg_inf(t) − Qreg_rel(t) − env(t) − E(t) − spill(t)
//! ```
//!
//! Water is allocated in a fixed priority order within each step:
//! environmental compensation first, then the regulated release, and
//! whatever exceeds capacity after that spills.

use crate::config::ReservoirConfig;

/// Drivers of a single step for a single member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInput {
    /// Storage at the start of the step.
    pub storage: f64,
    pub inflow: f64,
    /// Evaporation depth; the volume is depth × surface area.
    pub evaporation_depth: f64,
    pub env_requirement: f64,
    pub regulated_inflow: f64,
    /// Release asked for by the policy, or the demand.
    pub requested_release: f64,
}

/// Flows allocated during one step and the resulting storage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepFlows {
    pub env_flow: f64,
    pub regulated_release: f64,
    pub spill: f64,
    pub evaporation: f64,
    /// Storage at the start of the next step.
    pub storage: f64,
}

// f64::max and f64::min drop NaN operands; these keep them.
fn max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

fn min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

/// Advance one step.
pub fn step(config: &ReservoirConfig, input: &StepInput) -> StepFlows {
    let StepInput {
        storage,
        inflow,
        evaporation_depth,
        env_requirement,
        regulated_inflow,
        requested_release,
    } = *input;
    let evaporation = evaporation_depth * config.surface_area;
    let total_inflow = inflow + regulated_inflow;
    // water that can leave without dropping below dead storage
    let available = storage - config.storage_min + total_inflow - evaporation;

    let mut env_flow = if env_requirement >= total_inflow {
        total_inflow
    } else {
        env_requirement
    };
    // can only tighten the inflow check above
    if env_requirement >= available {
        env_flow = min(env_flow, max(available, 0.0));
    }

    let regulated_release = min(requested_release, max(available - env_flow, 0.0));

    let balance = storage + total_inflow - regulated_release - env_flow - evaporation;
    let spill = max(balance - config.storage_max, 0.0);
    // balance - spill can land an ulp above capacity
    let storage = min(max(balance - spill, config.storage_min), config.storage_max);

    StepFlows {
        env_flow,
        regulated_release,
        spill,
        evaporation,
        storage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ReservoirConfig {
        ReservoirConfig::new(5.0, 100.0, 20.0)
    }

    fn input(storage: f64, inflow: f64) -> StepInput {
        StepInput {
            storage,
            inflow,
            evaporation_depth: 1.0,
            env_requirement: 2.0,
            regulated_inflow: 0.0,
            requested_release: 9.0,
        }
    }

    #[test]
    fn test_step_plentiful_water() {
        let flows = step(&config(), &input(20.0, 10.0));
        assert_eq!(flows.env_flow, 2.0);
        assert_eq!(flows.regulated_release, 9.0);
        assert_eq!(flows.spill, 0.0);
        assert_eq!(flows.evaporation, 1.0);
        assert_eq!(flows.storage, 18.0);
    }

    #[test]
    fn test_step_release_throttled_at_dead_storage() {
        let flows = step(&config(), &input(6.0, 10.0));
        assert_eq!(flows.env_flow, 2.0);
        assert_eq!(flows.regulated_release, 8.0);
        assert_eq!(flows.storage, 5.0);
    }

    #[test]
    fn test_step_low_inflow_caps_env_flow() {
        let mut low = input(50.0, 1.0);
        low.env_requirement = 3.0;
        let flows = step(&config(), &low);
        assert_eq!(flows.env_flow, 1.0);
        assert_eq!(flows.regulated_release, 9.0);
        assert_eq!(flows.storage, 40.0);
    }

    #[test]
    fn test_step_no_water_available() {
        let mut dry = input(5.0, 0.5);
        dry.evaporation_depth = 2.0;
        let flows = step(&config(), &dry);
        assert_eq!(flows.env_flow, 0.0);
        assert_eq!(flows.regulated_release, 0.0);
        assert_eq!(flows.spill, 0.0);
        assert_eq!(flows.storage, 5.0);
    }

    #[test]
    fn test_step_spills_over_capacity() {
        let flows = step(&config(), &input(96.0, 50.0));
        assert_eq!(flows.spill, 34.0);
        assert_eq!(flows.storage, 100.0);
    }

    #[test]
    fn test_step_spill_never_leaves_storage_above_capacity() {
        let config = ReservoirConfig::new(0.0, 860.7808228554693, 0.0);
        let flows = step(
            &config,
            &StepInput {
                storage: 0.0,
                inflow: 15584.944235910329,
                evaporation_depth: 0.0,
                env_requirement: 0.0,
                regulated_inflow: 0.0,
                requested_release: 0.0,
            },
        );
        assert!(flows.spill > 0.0);
        assert!(flows.storage <= config.storage_max);
        assert_eq!(flows.storage, config.storage_max);
    }

    #[test]
    fn test_step_regulated_inflow_counts_toward_env_flow() {
        let mut pumped = input(50.0, 0.0);
        pumped.regulated_inflow = 4.0;
        let flows = step(&config(), &pumped);
        assert_eq!(flows.env_flow, 2.0);
        assert_eq!(flows.storage, 50.0 + 4.0 - 9.0 - 2.0 - 1.0);
    }

    #[test]
    fn test_step_nan_propagates() {
        let flows = step(&config(), &input(20.0, f64::NAN));
        assert_eq!(flows.env_flow, 2.0);
        assert!(flows.regulated_release.is_nan());
        assert!(flows.spill.is_nan());
        assert!(flows.storage.is_nan());
    }
}
