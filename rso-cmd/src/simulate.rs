//! The `simulate` command: run a scenario CSV through a configured reservoir.

use crate::input::{load_scenario, LoadedScenario, RunConfig};
use crate::output::write_trace;
use anyhow::{anyhow, Context};
use log::info;
use rso_engine::{simulate, Objectives, SimulationTrace};
use rso_utils::series::Series;
use std::fs::File;
use std::io::BufWriter;

/// Simulate `loaded` under `config` and score the result.
pub fn run_scenario(
    loaded: &LoadedScenario,
    config: &RunConfig,
    parallel: bool,
) -> anyhow::Result<(SimulationTrace, Objectives)> {
    let regulation = config.regulation(&loaded.dates)?;
    let options = config.options(parallel);
    let trace = simulate(&loaded.scenario, &config.reservoir, &regulation, &options)?;
    let target = config.storage_target.as_ref().map(Series::from);
    let objectives = Objectives::evaluate(&trace, &loaded.scenario.demand, target.as_ref())?;
    Ok((trace, objectives))
}

pub fn run_simulate(
    scenario_csv: &str,
    config_json: &str,
    output_csv: &str,
    parallel: bool,
) -> anyhow::Result<()> {
    let loaded = load_scenario(scenario_csv)?;
    let data = std::fs::read_to_string(config_json)
        .with_context(|| format!("Failed to read run config {}", config_json))?;
    let config = RunConfig::parse(&data)
        .with_context(|| format!("Failed to parse run config {}", config_json))?;

    let (steps, members) = loaded.scenario.dimensions()?;
    info!(
        "Simulating {} steps x {} members from {}",
        steps, members, scenario_csv
    );
    let (trace, objectives) = run_scenario(&loaded, &config, parallel)?;

    let inflow = loaded
        .scenario
        .inflow
        .broadcast(steps, members)
        .map_err(|e| anyhow!("{}", e))?;
    let file = File::create(output_csv)
        .with_context(|| format!("Failed to create {}", output_csv))?;
    write_trace(BufWriter::new(file), &loaded.dates, &inflow, &trace)?;

    info!(
        "Mean total squared deficit: {:.3}, mean total deficit: {:.3}",
        objectives.mean_squared_deficit(),
        objectives.mean_deficit()
    );
    if let Some(violation) = objectives.mean_storage_violation() {
        info!("Mean storage target violation: {:.3}", violation);
    }
    info!("Simulation complete. Output: {}", output_csv);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::parse_scenario_csv;

    const SCENARIO: &str = include_str!("../../fixtures/scenario.csv");
    const RUN_PIECEWISE: &str = include_str!("../../fixtures/run_piecewise.json");
    const RUN_RULE_CURVE: &str = include_str!("../../fixtures/run_rule_curve.json");
    const RUN_UNREGULATED: &str = include_str!("../../fixtures/run_unregulated.json");

    #[test]
    fn test_unregulated_fixture() {
        let loaded = parse_scenario_csv(SCENARIO).unwrap();
        let config = RunConfig::parse(RUN_UNREGULATED).unwrap();
        let (trace, objectives) = run_scenario(&loaded, &config, false).unwrap();
        assert_eq!(
            trace.storage.member(0),
            &[20.0, 18.0, 16.0, 14.0, 12.0, 10.0, 8.0, 6.0, 5.0, 5.0, 5.0]
        );
        assert_eq!(
            trace.spill.member(1),
            &[0.0, 0.0, 34.0, 38.0, 38.0, 38.0, 38.0, 38.0, 38.0, 38.0]
        );
        assert_eq!(objectives.total_deficit, vec![5.0, 0.0]);
        assert_eq!(objectives.storage_violation, None);
    }

    #[test]
    fn test_policies_from_fixtures() {
        let loaded = parse_scenario_csv(SCENARIO).unwrap();
        for data in [RUN_PIECEWISE, RUN_RULE_CURVE] {
            let config = RunConfig::parse(data).unwrap();
            let (sequential, objectives) = run_scenario(&loaded, &config, false).unwrap();
            let (parallel, _) = run_scenario(&loaded, &config, true).unwrap();
            assert_eq!(sequential, parallel);
            assert_eq!(objectives.total_squared_deficit.len(), 2);
            for s in trace_storage(&sequential) {
                assert!((5.0..=100.0).contains(&s));
            }
        }
    }

    fn trace_storage(trace: &SimulationTrace) -> Vec<f64> {
        (0..trace.members())
            .flat_map(|m| trace.storage.member(m).to_vec())
            .collect()
    }

    #[test]
    fn test_rule_curve_switches_with_season() {
        let loaded = parse_scenario_csv(SCENARIO).unwrap();
        let config = RunConfig::parse(RUN_RULE_CURVE).unwrap();
        let (trace, _) = run_scenario(&loaded, &config, false).unwrap();
        // wet member: summer rules release more from 1 Jul onwards
        let release = trace.regulated_release.member(1);
        assert!(release[5] > release[0]);
    }

    #[test]
    fn test_mismatched_schedule_is_reported() {
        let loaded = parse_scenario_csv(SCENARIO).unwrap();
        let config = RunConfig::parse(
            r#"{
                "reservoir": {"storage_min": 5, "storage_max": 100, "initial_storage": 20},
                "releases": {"type": "schedule", "values": [1, 2, 3]}
            }"#,
        )
        .unwrap();
        assert!(run_scenario(&loaded, &config, false).is_err());
    }
}
