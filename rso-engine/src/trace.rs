use crate::error::{Result, SimulationError};
use crate::mass_balance::StepFlows;
use rso_utils::series::Ensemble;

/// Output of one simulation run. Every flow series is `[T, M]`; `storage`
/// is `[T + 1, M]` and starts with the initial storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationTrace {
    pub storage: Ensemble,
    pub env_flow: Ensemble,
    pub spill: Ensemble,
    pub regulated_release: Ensemble,
    pub regulated_inflow: Ensemble,
    /// Evaporation volume (depth × surface area).
    pub evaporation: Ensemble,
}

impl SimulationTrace {
    pub fn steps(&self) -> usize {
        self.env_flow.steps()
    }

    pub fn members(&self) -> usize {
        self.env_flow.members()
    }

    pub(crate) fn assemble(steps: usize, traces: Vec<MemberTrace>) -> Result<Self> {
        let members = traces.len();
        let mut storage = Vec::with_capacity(members);
        let mut env_flow = Vec::with_capacity(members);
        let mut spill = Vec::with_capacity(members);
        let mut regulated_release = Vec::with_capacity(members);
        let mut regulated_inflow = Vec::with_capacity(members);
        let mut evaporation = Vec::with_capacity(members);
        for trace in traces {
            storage.push(trace.storage);
            env_flow.push(trace.env_flow);
            spill.push(trace.spill);
            regulated_release.push(trace.regulated_release);
            regulated_inflow.push(trace.regulated_inflow);
            evaporation.push(trace.evaporation);
        }
        let dense = |name: &str, traces: Vec<Vec<f64>>, len: usize| {
            if traces.is_empty() {
                return Ok(Ensemble::filled(len, 0, 0.0));
            }
            Ensemble::from_members(traces).map_err(|e| SimulationError::ShapeMismatch {
                series: name.to_string(),
                expected: e.expected,
                found: e.found,
            })
        };
        Ok(SimulationTrace {
            storage: dense("storage", storage, steps + 1)?,
            env_flow: dense("env_flow", env_flow, steps)?,
            spill: dense("spill", spill, steps)?,
            regulated_release: dense("regulated_release", regulated_release, steps)?,
            regulated_inflow: dense("regulated_inflow", regulated_inflow, steps)?,
            evaporation: dense("evaporation", evaporation, steps)?,
        })
    }
}

/// The trace of a single member while it is being simulated.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemberTrace {
    pub storage: Vec<f64>,
    pub env_flow: Vec<f64>,
    pub spill: Vec<f64>,
    pub regulated_release: Vec<f64>,
    pub regulated_inflow: Vec<f64>,
    pub evaporation: Vec<f64>,
}

impl MemberTrace {
    pub fn start(steps: usize, initial_storage: f64) -> Self {
        let mut storage = Vec::with_capacity(steps + 1);
        storage.push(initial_storage);
        MemberTrace {
            storage,
            env_flow: Vec::with_capacity(steps),
            spill: Vec::with_capacity(steps),
            regulated_release: Vec::with_capacity(steps),
            regulated_inflow: Vec::with_capacity(steps),
            evaporation: Vec::with_capacity(steps),
        }
    }

    pub fn record(&mut self, regulated_inflow: f64, flows: &StepFlows) {
        self.storage.push(flows.storage);
        self.env_flow.push(flows.env_flow);
        self.spill.push(flows.spill);
        self.regulated_release.push(flows.regulated_release);
        self.regulated_inflow.push(regulated_inflow);
        self.evaporation.push(flows.evaporation);
    }
}
