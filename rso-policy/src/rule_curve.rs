//! Seasonal rule curves.
//!
//! A rule curve is a set of storage-fraction bands ("curves") and release
//! bands ("rules"), each given as values at a few calendar dates such as
//! "1 Apr". Every band is interpolated onto all 366 days of the year.
//!
//! The first date is the anchor of the cycle. Later dates that fall earlier
//! in the calendar than the anchor are moved into the following year (+366),
//! and the last control point always closes the cycle at `anchor + 366`.
//! Day of year `k` then reads the interpolated cycle at `k` when `k` is on or
//! after the anchor, and at `k + 366` otherwise.

use crate::error::{PolicyError, Result};
use crate::lookup::{storage_grid, SeasonalTable};
use crate::piecewise::PiecewiseLinear;
use log::debug;
use rso_utils::dates::{parse_year_date, DAYS_IN_TABLE};
use rso_utils::interpolation::interp;
use serde::{Deserialize, Serialize};

const CYCLE: f64 = DAYS_IN_TABLE as f64;

/// Band values at a shared list of year dates.
///
/// In configuration files the band values are named `storage_frac` for curves
/// and `release` for rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandControlPoints {
    /// Dates such as "1 Apr", one per control point.
    pub year_date: Vec<String>,
    /// One row per band, one value per date.
    #[serde(alias = "storage_frac", alias = "release")]
    pub bands: Vec<Vec<f64>>,
}

/// Storage-fraction and release bands for every day of the year.
///
/// `storage_bands[j][d]` and `release_bands[j][d]` are the values of band
/// `j` on day of year `d + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleCurveTable {
    pub storage_bands: Vec<Vec<f64>>,
    pub release_bands: Vec<Vec<f64>>,
}

/// Interpolate curve (storage-fraction) and rule (release) control points
/// onto the 366-day table.
pub fn build_rule_curve(
    curve_points: &BandControlPoints,
    rule_points: &BandControlPoints,
) -> Result<RuleCurveTable> {
    let storage_bands = interpolate_bands(curve_points)?;
    let release_bands = interpolate_bands(rule_points)?;
    debug!(
        "rule curve tabulated: {} storage bands, {} release bands",
        storage_bands.len(),
        release_bands.len()
    );
    Ok(RuleCurveTable {
        storage_bands,
        release_bands,
    })
}

/// Positions of the control dates on the rotated cycle.
fn cycle_positions(year_date: &[String]) -> Result<Vec<f64>> {
    if year_date.len() < 2 {
        return Err(PolicyError::InvalidPolicySpec(format!(
            "rule curve needs at least 2 control dates, got {}",
            year_date.len()
        )));
    }
    let days = year_date
        .iter()
        .map(|d| {
            parse_year_date(d).map_err(|e| PolicyError::DateParse(format!("{d}: {e}")))
        })
        .collect::<Result<Vec<u32>>>()?;
    let anchor = days[0] as f64;
    let mut positions: Vec<f64> = days
        .iter()
        .map(|d| {
            let day = *d as f64;
            if day < anchor {
                day + CYCLE
            } else {
                day
            }
        })
        .collect();
    let last = positions.len() - 1;
    positions[last] = anchor + CYCLE;
    if let Some(i) = positions.windows(2).position(|w| w[1] <= w[0]) {
        return Err(PolicyError::InvalidPolicySpec(format!(
            "control date `{}` does not follow `{}` within the cycle starting `{}`",
            year_date[i + 1], year_date[i], year_date[0]
        )));
    }
    Ok(positions)
}

fn interpolate_bands(points: &BandControlPoints) -> Result<Vec<Vec<f64>>> {
    let positions = cycle_positions(&points.year_date)?;
    if points.bands.is_empty() {
        return Err(PolicyError::InvalidPolicySpec(
            "rule curve needs at least one band".to_string(),
        ));
    }
    let anchor = positions[0];
    let mut bands = Vec::with_capacity(points.bands.len());
    for (j, band) in points.bands.iter().enumerate() {
        if band.len() != positions.len() {
            return Err(PolicyError::InvalidPolicySpec(format!(
                "band {j} has {} values for {} dates",
                band.len(),
                positions.len()
            )));
        }
        if let Some(v) = band.iter().find(|v| !v.is_finite()) {
            return Err(PolicyError::InvalidPolicySpec(format!(
                "band {j} holds non-numeric value {v}"
            )));
        }
        let daily = (1..=DAYS_IN_TABLE)
            .map(|k| {
                let day = k as f64;
                let position = if day >= anchor { day } else { day + CYCLE };
                interp(position, &positions, band)
            })
            .collect();
        bands.push(daily);
    }
    Ok(bands)
}

impl SeasonalTable {
    /// Build a per-day lookup from a rule-curve table: on each day the bands'
    /// `(storage fraction, release)` pairs are the control points of a
    /// piecewise-linear policy.
    pub fn from_rule_curve(table: &RuleCurveTable, resolution: f64) -> Result<Self> {
        let bands = table.storage_bands.len();
        if bands != table.release_bands.len() {
            return Err(PolicyError::InvalidPolicySpec(format!(
                "{} storage bands but {} release bands",
                bands,
                table.release_bands.len()
            )));
        }
        let kinds = [("storage", &table.storage_bands), ("release", &table.release_bands)];
        for (kind, kind_bands) in kinds {
            if let Some((j, band)) = kind_bands
                .iter()
                .enumerate()
                .find(|(_, band)| band.len() != DAYS_IN_TABLE)
            {
                return Err(PolicyError::InvalidPolicySpec(format!(
                    "{kind} band {j} has {} days, expected {DAYS_IN_TABLE}",
                    band.len()
                )));
            }
        }
        let grid = storage_grid(resolution)?;
        let mut columns = Vec::with_capacity(DAYS_IN_TABLE);
        let mut points = Vec::with_capacity(bands);
        for day in 0..DAYS_IN_TABLE {
            points.clear();
            points.extend(
                table
                    .storage_bands
                    .iter()
                    .zip(&table.release_bands)
                    .map(|(s, r)| (s[day], r[day])),
            );
            let policy = PiecewiseLinear::new(&points).map_err(|e| match e {
                PolicyError::InvalidPolicySpec(reason) => {
                    PolicyError::InvalidPolicySpec(format!("day {}: {reason}", day + 1))
                }
                other => other,
            })?;
            columns.push(grid.iter().map(|s| policy.value(*s)).collect());
        }
        SeasonalTable::new(grid, columns)
    }
}
