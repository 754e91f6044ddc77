//! Runs the mass balance over every step of every ensemble member.

use crate::config::{ExecutionMode, ReservoirConfig, SimulationOptions};
use crate::error::{Result, SimulationError};
use crate::mass_balance::{step, StepInput};
use crate::scenario::{Regulation, Scenario};
use crate::trace::{MemberTrace, SimulationTrace};
use log::debug;
use rayon::prelude::*;
use rso_policy::{Policy, SeasonalLookup, StaticLookup};
use rso_utils::series::{Ensemble, Series};

/// Scenario drivers broadcast to the run's `[T, M]` shape.
struct Drivers {
    inflow: Ensemble,
    evaporation: Ensemble,
    demand: Ensemble,
    env_requirement: Ensemble,
}

impl Drivers {
    fn broadcast(scenario: &Scenario, steps: usize, members: usize) -> Result<Self> {
        let dense = |name: &str, series: &Series| broadcast(name, series, steps, members);
        Ok(Drivers {
            inflow: dense("inflow", &scenario.inflow)?,
            evaporation: dense("evaporation", &scenario.evaporation)?,
            demand: dense("demand", &scenario.demand)?,
            env_requirement: dense("env_requirement", &scenario.env_requirement)?,
        })
    }
}

fn broadcast(name: &str, series: &Series, steps: usize, members: usize) -> Result<Ensemble> {
    series
        .broadcast(steps, members)
        .map_err(|e| SimulationError::ShapeMismatch {
            series: name.to_string(),
            expected: e.expected,
            found: e.found,
        })
}

/// A regulation channel checked against the run's shape.
enum Channel<'a> {
    Unregulated,
    Series(Ensemble),
    Static(&'a StaticLookup),
    Seasonal(&'a SeasonalLookup),
}

impl<'a> Channel<'a> {
    fn resolve(name: &str, policy: &'a Policy, steps: usize, members: usize) -> Result<Self> {
        match policy {
            Policy::None => Ok(Channel::Unregulated),
            Policy::ExplicitSeries(series) => {
                broadcast(&format!("{name} schedule"), series, steps, members).map(Channel::Series)
            }
            Policy::StaticLookup(lookup) => Ok(Channel::Static(lookup)),
            Policy::SeasonalLookup(lookup) => {
                if lookup.steps() != steps {
                    return Err(SimulationError::ShapeMismatch {
                        series: format!("{name} day index"),
                        expected: (steps, 1),
                        found: (lookup.steps(), 1),
                    });
                }
                Ok(Channel::Seasonal(lookup))
            }
        }
    }

    /// The view one member reads; `unregulated` stands in for a channel
    /// without a policy.
    fn for_member(&'a self, m: usize, unregulated: MemberChannel<'a>) -> MemberChannel<'a> {
        match self {
            Channel::Unregulated => unregulated,
            Channel::Series(ensemble) => MemberChannel::Values(ensemble.member(m)),
            Channel::Static(lookup) => MemberChannel::Static(lookup),
            Channel::Seasonal(lookup) => MemberChannel::Seasonal(lookup),
        }
    }
}

#[derive(Clone, Copy)]
enum MemberChannel<'a> {
    Values(&'a [f64]),
    Constant(f64),
    Static(&'a StaticLookup),
    Seasonal(&'a SeasonalLookup),
}

impl MemberChannel<'_> {
    fn flow(&self, t: usize, storage_fraction: f64) -> f64 {
        match self {
            MemberChannel::Values(values) => values[t],
            MemberChannel::Constant(value) => *value,
            MemberChannel::Static(lookup) => lookup.value(storage_fraction),
            MemberChannel::Seasonal(lookup) => lookup.value(t, storage_fraction),
        }
    }
}

fn run_member(
    config: &ReservoirConfig,
    drivers: &Drivers,
    releases: &Channel,
    inflows: &Channel,
    steps: usize,
    m: usize,
) -> MemberTrace {
    let inflow = drivers.inflow.member(m);
    let evaporation = drivers.evaporation.member(m);
    let env_requirement = drivers.env_requirement.member(m);
    let release_channel = releases.for_member(m, MemberChannel::Values(drivers.demand.member(m)));
    let inflow_channel = inflows.for_member(m, MemberChannel::Constant(0.0));

    let mut trace = MemberTrace::start(steps, config.initial_storage);
    let mut storage = config.initial_storage;
    for t in 0..steps {
        let fraction = storage / config.storage_max;
        let regulated_inflow = inflow_channel.flow(t, fraction);
        let flows = step(
            config,
            &StepInput {
                storage,
                inflow: inflow[t],
                evaporation_depth: evaporation[t],
                env_requirement: env_requirement[t],
                regulated_inflow,
                requested_release: release_channel.flow(t, fraction),
            },
        );
        trace.record(regulated_inflow, &flows);
        storage = flows.storage;
    }
    trace
}

/// Simulate every member of `scenario` under `regulation`.
///
/// All validation happens before the first step; members are independent,
/// so the parallel mode returns exactly the sequential result.
pub fn simulate(
    scenario: &Scenario,
    config: &ReservoirConfig,
    regulation: &Regulation,
    options: &SimulationOptions,
) -> Result<SimulationTrace> {
    config.validate()?;
    let (steps, members) = scenario.dimensions()?;
    let drivers = Drivers::broadcast(scenario, steps, members)?;
    let releases = Channel::resolve("releases", &regulation.releases, steps, members)?;
    let inflows = Channel::resolve("inflows", &regulation.inflows, steps, members)?;

    debug!(
        "simulating {} steps x {} members (releases: {}, inflows: {}, {:?})",
        steps,
        members,
        regulation.releases.kind(),
        regulation.inflows.kind(),
        options.execution
    );

    let run = |m: usize| run_member(config, &drivers, &releases, &inflows, steps, m);
    let traces: Vec<MemberTrace> = match options.execution {
        ExecutionMode::Sequential => (0..members).map(run).collect(),
        ExecutionMode::Parallel => (0..members).into_par_iter().map(run).collect(),
    };
    SimulationTrace::assemble(steps, traces)
}

/// Sequential run with only the release channel regulated.
pub fn simulate_with_policy(
    scenario: &Scenario,
    config: &ReservoirConfig,
    policy: impl Into<Policy>,
) -> Result<SimulationTrace> {
    simulate(
        scenario,
        config,
        &Regulation::releases(policy),
        &SimulationOptions::default(),
    )
}
