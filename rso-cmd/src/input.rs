//! Loading scenarios and run configurations from disk.

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use rso_engine::{Regulation, ReservoirConfig, Scenario, SimulationOptions};
use rso_policy::{BandControlPoints, PolicySpec};
use rso_utils::dates::parse_date;
use rso_utils::series::{Ensemble, Series};
use serde::Deserialize;
use std::collections::BTreeMap;

/// One row of a scenario CSV:
/// `date,member,inflow,evaporation,demand,env_requirement`.
#[derive(Debug, Deserialize)]
struct ScenarioRow {
    date: String,
    member: usize,
    inflow: f64,
    evaporation: f64,
    demand: f64,
    env_requirement: f64,
}

/// A scenario together with the calendar date of every step.
#[derive(Debug, Clone)]
pub struct LoadedScenario {
    pub dates: Vec<NaiveDate>,
    pub scenario: Scenario,
}

impl LoadedScenario {
    pub fn steps(&self) -> usize {
        self.dates.len()
    }
}

/// Parse a scenario CSV. Every member must list the same increasing dates.
/// Member ids are sorted, so they need not be contiguous.
pub fn parse_scenario_csv(data: &str) -> anyhow::Result<LoadedScenario> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let mut members: BTreeMap<usize, Vec<(NaiveDate, ScenarioRow)>> = BTreeMap::new();
    for (line, result) in rdr.deserialize::<ScenarioRow>().enumerate() {
        let row = result.with_context(|| format!("Bad scenario row {}", line + 1))?;
        let date = parse_date(&row.date)
            .with_context(|| format!("Bad date {:?} in scenario row {}", row.date, line + 1))?;
        members.entry(row.member).or_default().push((date, row));
    }

    let first = members
        .values()
        .next()
        .ok_or_else(|| anyhow!("Scenario CSV has no rows"))?;
    let dates: Vec<NaiveDate> = first.iter().map(|(date, _)| *date).collect();
    if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
        bail!("Scenario dates must increase, found {} after {}", w[1], w[0]);
    }
    for (member, rows) in &members {
        if rows.len() != dates.len() || rows.iter().zip(&dates).any(|((d, _), e)| d != e) {
            bail!("Member {} does not cover the same dates as the first member", member);
        }
    }

    let column = |f: fn(&ScenarioRow) -> f64| -> anyhow::Result<Series> {
        if members.len() == 1 {
            return Ok(Series::Steps(first.iter().map(|(_, row)| f(row)).collect()));
        }
        let ensemble = Ensemble::from_members(
            members
                .values()
                .map(|rows| rows.iter().map(|(_, row)| f(row)).collect())
                .collect(),
        )
        .map_err(|e| anyhow!("{}", e))?;
        Ok(Series::Ensemble(ensemble))
    };

    let scenario = Scenario::new(
        column(|r| r.inflow)?,
        column(|r| r.evaporation)?,
        column(|r| r.demand)?,
        column(|r| r.env_requirement)?,
    );
    Ok(LoadedScenario { dates, scenario })
}

pub fn load_scenario(path: &str) -> anyhow::Result<LoadedScenario> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario CSV {}", path))?;
    parse_scenario_csv(&data).with_context(|| format!("Failed to parse scenario CSV {}", path))
}

/// A storage target: one value, or one per storage value (`T + 1`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StorageTarget {
    Constant(f64),
    Schedule(Vec<f64>),
}

impl From<&StorageTarget> for Series {
    fn from(target: &StorageTarget) -> Self {
        match target {
            StorageTarget::Constant(value) => Series::Constant(*value),
            StorageTarget::Schedule(values) => Series::Steps(values.clone()),
        }
    }
}

/// The JSON configuration of a `simulate` run.
///
/// ```json
/// {
///   "reservoir": {"storage_min": 5, "storage_max": 100, "initial_storage": 20},
///   "releases": {"type": "piecewise_linear", "points": [[0, 2], [1, 10]]},
///   "storage_target": 30
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunConfig {
    pub reservoir: ReservoirConfig,
    #[serde(default)]
    pub releases: PolicySpec,
    #[serde(default)]
    pub inflows: PolicySpec,
    /// One policy for both channels; excludes `releases` and `inflows`.
    #[serde(default)]
    pub combined: Option<PolicySpec>,
    #[serde(default)]
    pub storage_target: Option<StorageTarget>,
    #[serde(default)]
    pub parallel: bool,
}

impl RunConfig {
    pub fn parse(data: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Resolve the policies against the scenario's dates.
    pub fn regulation(&self, dates: &[NaiveDate]) -> anyhow::Result<Regulation> {
        if let Some(combined) = &self.combined {
            if self.releases != PolicySpec::None || self.inflows != PolicySpec::None {
                bail!("\"combined\" cannot be used together with \"releases\" or \"inflows\"");
            }
            let policy = combined
                .resolve(Some(dates))
                .context("Invalid combined policy")?;
            return Ok(Regulation::combined(policy));
        }
        Ok(Regulation {
            releases: self
                .releases
                .resolve(Some(dates))
                .context("Invalid release policy")?,
            inflows: self
                .inflows
                .resolve(Some(dates))
                .context("Invalid inflow policy")?,
        })
    }

    pub fn options(&self, parallel: bool) -> SimulationOptions {
        if parallel || self.parallel {
            SimulationOptions::parallel()
        } else {
            SimulationOptions::default()
        }
    }
}

/// The JSON input of the `rule-curve` command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuleCurveConfig {
    pub curves: BandControlPoints,
    pub rules: BandControlPoints,
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let data =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    serde_json::from_str(&data).with_context(|| format!("Failed to parse {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rso_policy::Policy;

    const SCENARIO: &str = include_str!("../../fixtures/scenario.csv");
    const RUN_PIECEWISE: &str = include_str!("../../fixtures/run_piecewise.json");
    const RUN_RULE_CURVE: &str = include_str!("../../fixtures/run_rule_curve.json");

    #[test]
    fn test_parse_scenario_fixture() {
        let loaded = parse_scenario_csv(SCENARIO).unwrap();
        assert_eq!(loaded.steps(), 10);
        assert_eq!(loaded.dates[0], NaiveDate::from_ymd_opt(2021, 6, 27).unwrap());
        assert_eq!(loaded.scenario.dimensions().unwrap(), (10, 2));
        match &loaded.scenario.inflow {
            Series::Ensemble(e) => {
                assert_eq!(e.get(0, 0), 10.0);
                assert_eq!(e.get(0, 1), 50.0);
            }
            other => panic!("unexpected inflow {other:?}"),
        }
    }

    #[test]
    fn test_single_member_is_a_plain_trace() {
        let data = "date,member,inflow,evaporation,demand,env_requirement\n\
                    2021-01-01,0,10,1,9,2\n\
                    2021-01-02,0,11,1,9,2\n";
        let loaded = parse_scenario_csv(data).unwrap();
        assert_eq!(loaded.scenario.inflow, Series::Steps(vec![10.0, 11.0]));
    }

    #[test]
    fn test_scenario_errors() {
        let header = "date,member,inflow,evaporation,demand,env_requirement\n";
        assert!(parse_scenario_csv(header).is_err());

        let backwards = format!("{header}2021-01-02,0,1,1,1,1\n2021-01-01,0,1,1,1,1\n");
        assert!(parse_scenario_csv(&backwards).is_err());

        let ragged = format!(
            "{header}2021-01-01,0,1,1,1,1\n2021-01-02,0,1,1,1,1\n2021-01-01,1,1,1,1,1\n"
        );
        assert!(parse_scenario_csv(&ragged).is_err());

        let bad_date = format!("{header}01/01/2021,0,1,1,1,1\n");
        assert!(parse_scenario_csv(&bad_date).is_err());

        let bad_number = format!("{header}2021-01-01,0,lots,1,1,1\n");
        assert!(parse_scenario_csv(&bad_number).is_err());
    }

    #[test]
    fn test_run_config_piecewise() {
        let config = RunConfig::parse(RUN_PIECEWISE).unwrap();
        assert_eq!(config.reservoir.storage_max, 100.0);
        assert_eq!(config.storage_target, Some(StorageTarget::Constant(10.0)));
        let loaded = parse_scenario_csv(SCENARIO).unwrap();
        let regulation = config.regulation(&loaded.dates).unwrap();
        assert_eq!(regulation.releases.kind(), "static lookup");
        assert!(regulation.inflows.is_none());
        assert_ne!(config.options(false), config.options(true));
    }

    #[test]
    fn test_run_config_rule_curve() {
        let config = RunConfig::parse(RUN_RULE_CURVE).unwrap();
        let loaded = parse_scenario_csv(SCENARIO).unwrap();
        let regulation = config.regulation(&loaded.dates).unwrap();
        match &regulation.releases {
            Policy::SeasonalLookup(lookup) => assert_eq!(lookup.steps(), 10),
            other => panic!("unexpected policy {other:?}"),
        }
        assert!(config.parallel);
    }

    #[test]
    fn test_combined_excludes_channels() {
        let config = RunConfig::parse(
            r#"{
                "reservoir": {"storage_min": 5, "storage_max": 100, "initial_storage": 20},
                "releases": {"type": "schedule", "values": [1, 2]},
                "combined": {"type": "schedule", "values": [1, 2]}
            }"#,
        )
        .unwrap();
        assert!(config.regulation(&[]).is_err());

        let combined = RunConfig::parse(
            r#"{
                "reservoir": {"storage_min": 5, "storage_max": 100, "initial_storage": 20},
                "combined": {"type": "schedule", "values": [1, 2]}
            }"#,
        )
        .unwrap();
        let regulation = combined.regulation(&[]).unwrap();
        assert_eq!(regulation.releases, regulation.inflows);
    }
}
