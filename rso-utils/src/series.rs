//! Time series with an optional ensemble-member axis.
//!
//! Scenario drivers arrive as a scalar, a single `[T]` trace shared by every
//! member, or a full `[T, M]` ensemble. [`Series::broadcast`] expands any of
//! them to a dense [`Ensemble`] so the simulation kernel only ever reads
//! contiguous per-member slices.

use crate::error::ShapeError;

/// A dense `[T, M]` array stored member-major: each member's `T` values are
/// contiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    steps: usize,
    members: usize,
    values: Vec<f64>,
}

impl Ensemble {
    /// An ensemble with every entry set to `value`.
    pub fn filled(steps: usize, members: usize, value: f64) -> Self {
        Ensemble {
            steps,
            members,
            values: vec![value; steps * members],
        }
    }

    /// Build from one trace per member. All traces must have the same length.
    pub fn from_members(traces: Vec<Vec<f64>>) -> Result<Self, ShapeError> {
        let members = traces.len();
        let steps = traces.first().map_or(0, |t| t.len());
        let mut values = Vec::with_capacity(steps * members);
        for trace in traces {
            if trace.len() != steps {
                return Err(ShapeError {
                    expected: (steps, members),
                    found: (trace.len(), members),
                });
            }
            values.extend(trace);
        }
        Ok(Ensemble {
            steps,
            members,
            values,
        })
    }

    /// Build from one row per time step, each row holding one value per member.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ShapeError> {
        let steps = rows.len();
        let members = rows.first().map_or(0, |r| r.len());
        let mut values = vec![0.0; steps * members];
        for (t, row) in rows.iter().enumerate() {
            if row.len() != members {
                return Err(ShapeError {
                    expected: (steps, members),
                    found: (steps, row.len()),
                });
            }
            for (m, value) in row.iter().enumerate() {
                values[m * steps + t] = *value;
            }
        }
        Ok(Ensemble {
            steps,
            members,
            values,
        })
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn members(&self) -> usize {
        self.members
    }

    /// Value at time step `t` for member `m`.
    pub fn get(&self, t: usize, m: usize) -> f64 {
        self.values[m * self.steps + t]
    }

    /// The full trace of member `m`.
    pub fn member(&self, m: usize) -> &[f64] {
        &self.values[m * self.steps..(m + 1) * self.steps]
    }

    /// Iterate over member traces in member order.
    pub fn iter_members(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.members).map(move |m| self.member(m))
    }
}

/// A scenario driver, before broadcasting.
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    /// One value for every step and member.
    Constant(f64),
    /// One `[T]` trace shared by every member.
    Steps(Vec<f64>),
    /// A full `[T, M]` ensemble. A single-member ensemble is shared by every
    /// member.
    Ensemble(Ensemble),
}

impl Series {
    /// Number of time steps, if this series carries a time axis.
    pub fn steps(&self) -> Option<usize> {
        match self {
            Series::Constant(_) => None,
            Series::Steps(values) => Some(values.len()),
            Series::Ensemble(ensemble) => Some(ensemble.steps()),
        }
    }

    /// Number of ensemble members, if this series carries more than one.
    pub fn members(&self) -> Option<usize> {
        match self {
            Series::Ensemble(ensemble) if ensemble.members() != 1 => Some(ensemble.members()),
            _ => None,
        }
    }

    fn shape(&self) -> (usize, usize) {
        match self {
            Series::Constant(_) => (1, 1),
            Series::Steps(values) => (values.len(), 1),
            Series::Ensemble(ensemble) => (ensemble.steps(), ensemble.members()),
        }
    }

    /// Expand to a dense `[steps, members]` ensemble.
    pub fn broadcast(&self, steps: usize, members: usize) -> Result<Ensemble, ShapeError> {
        let mismatch = || ShapeError {
            expected: (steps, members),
            found: self.shape(),
        };
        match self {
            Series::Constant(value) => Ok(Ensemble::filled(steps, members, *value)),
            Series::Steps(values) => {
                if values.len() != steps {
                    return Err(mismatch());
                }
                let mut dense = Vec::with_capacity(steps * members);
                for _ in 0..members {
                    dense.extend_from_slice(values);
                }
                Ok(Ensemble {
                    steps,
                    members,
                    values: dense,
                })
            }
            Series::Ensemble(ensemble) => {
                if ensemble.steps() != steps {
                    return Err(mismatch());
                }
                if ensemble.members() == members {
                    Ok(ensemble.clone())
                } else if ensemble.members() == 1 {
                    Series::Steps(ensemble.member(0).to_vec()).broadcast(steps, members)
                } else {
                    Err(mismatch())
                }
            }
        }
    }
}

impl From<f64> for Series {
    fn from(value: f64) -> Self {
        Series::Constant(value)
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Series::Steps(values)
    }
}

impl From<Ensemble> for Series {
    fn from(ensemble: Ensemble) -> Self {
        Series::Ensemble(ensemble)
    }
}
