//! Piecewise-linear operating policies defined by control points.
//!
//! Control points are `(storage_fraction, value)` pairs. Authors often place
//! a reference point out of order so that it clips its neighbours; instead of
//! rejecting such input, every node takes the minimum of itself and all
//! nodes to its right, which yields a non-decreasing function. The first and
//! last nodes are pinned to storage fractions 0 and 1.

use crate::error::{PolicyError, Result};
use crate::lookup::{PolicyEvaluator, StaticLookup};
use log::debug;
use rso_utils::interpolation::interp;

/// A piecewise-linear policy after the suffix-minimum repair.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseLinear {
    fractions: Vec<f64>,
    values: Vec<f64>,
}

impl PiecewiseLinear {
    /// Validate and repair `points`.
    pub fn new(points: &[(f64, f64)]) -> Result<Self> {
        validate_points(points)?;
        let (fractions, values) = suffix_minimum(points);
        let repaired = fractions.iter().zip(&values);
        for (i, ((s, u), (rs, ru))) in points.iter().zip(repaired).enumerate() {
            if s != rs || u != ru {
                debug!("control point {i} ({s}, {u}) repaired to ({rs}, {ru})");
            }
        }
        Ok(PiecewiseLinear { fractions, values })
    }

    /// Repaired storage fractions, from exactly 0 to exactly 1.
    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }

    /// Repaired node values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value(&self, storage_fraction: f64) -> f64 {
        interp(storage_fraction, &self.fractions, &self.values)
    }
}

impl PolicyEvaluator for PiecewiseLinear {
    fn evaluate(&self, storage_fraction: f64, _day_of_year: Option<u32>) -> f64 {
        self.value(storage_fraction)
    }
}

fn validate_points(points: &[(f64, f64)]) -> Result<()> {
    if points.len() < 2 {
        return Err(PolicyError::InvalidPolicySpec(format!(
            "piecewise-linear policy needs at least 2 control points, got {}",
            points.len()
        )));
    }
    for (i, (s, u)) in points.iter().enumerate() {
        if !s.is_finite() || !u.is_finite() {
            return Err(PolicyError::InvalidPolicySpec(format!(
                "control point {i} ({s}, {u}) is not numeric"
            )));
        }
        if !(0.0..=1.0).contains(s) {
            return Err(PolicyError::InvalidPolicySpec(format!(
                "control point {i} storage fraction {s} outside [0, 1]"
            )));
        }
    }
    for (i, (s, u)) in points.iter().enumerate() {
        if let Some((j, (_, other))) = points
            .iter()
            .enumerate()
            .skip(i + 1)
            .find(|(_, (other_s, other_u))| other_s == s && other_u != u)
        {
            return Err(PolicyError::InvalidPolicySpec(format!(
                "control points {i} and {j} share storage fraction {s} with values {u} and {other}"
            )));
        }
    }
    Ok(())
}

/// Running minimum of every coordinate over the node and all nodes to its
/// right, with the end fractions forced to 0 and 1.
fn suffix_minimum(points: &[(f64, f64)]) -> (Vec<f64>, Vec<f64>) {
    let n = points.len();
    let mut fractions = vec![0.0; n];
    let mut values = vec![0.0; n];
    let (mut min_s, mut min_u) = (f64::INFINITY, f64::INFINITY);
    for i in (0..n).rev() {
        min_s = min_s.min(points[i].0);
        min_u = min_u.min(points[i].1);
        fractions[i] = min_s;
        values[i] = min_u;
    }
    fractions[0] = 0.0;
    fractions[n - 1] = 1.0;
    (fractions, values)
}

/// Build a dense lookup from control points on a grid of the given
/// resolution (0.01 by default, see [`crate::lookup::DEFAULT_RESOLUTION`]).
pub fn build_piecewise_linear(points: &[(f64, f64)], resolution: f64) -> Result<StaticLookup> {
    let policy = PiecewiseLinear::new(points)?;
    StaticLookup::tabulate(&policy, resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::DEFAULT_RESOLUTION;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ordered_points_interpolate() {
        let points = [(0.0, 2.0), (0.4, 5.0), (1.0, 10.0)];
        let lookup = build_piecewise_linear(&points, DEFAULT_RESOLUTION).unwrap();
        assert_eq!(lookup.grid().len(), 101);
        assert_eq!(lookup.values()[0], 2.0);
        assert!(close(lookup.values()[20], 3.5));
        assert!(close(lookup.values()[40], 5.0));
        assert!(close(lookup.values()[70], 7.5));
        assert_eq!(lookup.values()[100], 10.0);
    }

    #[test]
    fn test_suffix_minimum_repair() {
        // the third point clips the second one
        let policy =
            PiecewiseLinear::new(&[(0.1, 8.0), (0.6, 6.0), (0.4, 4.0), (0.9, 9.0)]).unwrap();
        assert_eq!(policy.fractions(), &[0.0, 0.4, 0.4, 1.0]);
        assert_eq!(policy.values(), &[4.0, 4.0, 4.0, 9.0]);
    }

    #[test]
    fn test_boundary_fractions_forced() {
        let policy = PiecewiseLinear::new(&[(0.2, 1.0), (0.8, 3.0)]).unwrap();
        assert_eq!(policy.fractions(), &[0.0, 1.0]);
        assert_eq!(policy.value(0.5), 2.0);
    }

    #[test]
    fn test_repair_is_non_decreasing() {
        let lookup = build_piecewise_linear(
            &[(0.0, 5.0), (0.3, 1.0), (0.7, 6.0), (0.5, 3.0), (1.0, 2.0)],
            DEFAULT_RESOLUTION,
        )
        .unwrap();
        assert!(lookup.values().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_rebuild_from_output_is_fixed_point() {
        let first = build_piecewise_linear(
            &[(0.0, 3.0), (0.6, 7.0), (0.35, 5.0), (1.0, 12.0)],
            DEFAULT_RESOLUTION,
        )
        .unwrap();
        let points: Vec<(f64, f64)> = first
            .grid()
            .iter()
            .copied()
            .zip(first.values().iter().copied())
            .collect();
        let second = build_piecewise_linear(&points, DEFAULT_RESOLUTION).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_points() {
        assert!(matches!(
            PiecewiseLinear::new(&[(0.0, 1.0)]),
            Err(PolicyError::InvalidPolicySpec(_))
        ));
        assert!(PiecewiseLinear::new(&[(0.0, 1.0), (f64::NAN, 2.0)]).is_err());
        assert!(PiecewiseLinear::new(&[(0.0, 1.0), (1.2, 2.0)]).is_err());
        assert!(PiecewiseLinear::new(&[(0.0, 1.0), (0.5, 2.0), (0.5, 3.0), (1.0, 4.0)]).is_err());
        assert!(PiecewiseLinear::new(&[(0.0, 1.0), (0.5, 2.0), (0.5, 2.0), (1.0, 4.0)]).is_ok());
    }
}
