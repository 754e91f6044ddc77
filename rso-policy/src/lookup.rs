//! Dense lookup tables over the storage-fraction axis.

use crate::error::{PolicyError, Result};
use rso_utils::dates::DAYS_IN_TABLE;
use rso_utils::interpolation::{interp, unit_grid};
use std::sync::Arc;

/// Default spacing of the storage-fraction grid.
pub const DEFAULT_RESOLUTION: f64 = 0.01;

/// Anything that maps reservoir state, and optionally the calendar day, to a
/// regulated flow.
///
/// Callers implement this for custom operating rules and tabulate them with
/// [`StaticLookup::tabulate`] or [`SeasonalTable::tabulate`] before a run.
pub trait PolicyEvaluator: Send + Sync {
    /// Flow for a storage fraction (storage / capacity). `day_of_year` is
    /// 1-based when given.
    fn evaluate(&self, storage_fraction: f64, day_of_year: Option<u32>) -> f64;
}

/// Storage-fraction grid on `[0, 1]` with the given spacing.
pub fn storage_grid(resolution: f64) -> Result<Vec<f64>> {
    unit_grid(resolution).ok_or_else(|| PolicyError::InvalidParameter {
        name: "resolution",
        reason: format!("{resolution} must lie in (0, 1] and divide 1 evenly"),
    })
}

fn check_breakpoints(grid: &[f64]) -> Result<()> {
    if grid.len() < 2 {
        return Err(PolicyError::InvalidPolicySpec(format!(
            "lookup needs at least 2 breakpoints, got {}",
            grid.len()
        )));
    }
    if grid[0] != 0.0 || grid[grid.len() - 1] != 1.0 {
        return Err(PolicyError::InvalidPolicySpec(format!(
            "storage fractions must span [0, 1], got [{}, {}]",
            grid[0],
            grid[grid.len() - 1]
        )));
    }
    if grid.iter().any(|s| !s.is_finite()) || grid.windows(2).any(|w| w[1] < w[0]) {
        return Err(PolicyError::InvalidPolicySpec(
            "storage fractions must be sorted ascending".to_string(),
        ));
    }
    Ok(())
}

fn check_values(grid: &[f64], values: &[f64]) -> Result<()> {
    if values.len() != grid.len() {
        return Err(PolicyError::InvalidPolicySpec(format!(
            "{} values for {} breakpoints",
            values.len(),
            grid.len()
        )));
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(PolicyError::InvalidPolicySpec(format!(
            "non-finite value {} at storage fraction {}",
            values[i], grid[i]
        )));
    }
    Ok(())
}

/// A one-dimensional lookup: flow as a function of storage fraction.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticLookup {
    grid: Vec<f64>,
    values: Vec<f64>,
}

impl StaticLookup {
    pub fn new(grid: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        check_breakpoints(&grid)?;
        check_values(&grid, &values)?;
        Ok(StaticLookup { grid, values })
    }

    /// Sample `evaluator` (without a calendar day) on a grid of the given
    /// resolution.
    pub fn tabulate(evaluator: &dyn PolicyEvaluator, resolution: f64) -> Result<Self> {
        let grid = storage_grid(resolution)?;
        let values = grid.iter().map(|s| evaluator.evaluate(*s, None)).collect();
        StaticLookup::new(grid, values)
    }

    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Flow at `storage_fraction`, clamped to the boundary values outside
    /// `[0, 1]`.
    pub fn value(&self, storage_fraction: f64) -> f64 {
        interp(storage_fraction, &self.grid, &self.values)
    }
}

impl PolicyEvaluator for StaticLookup {
    fn evaluate(&self, storage_fraction: f64, _day_of_year: Option<u32>) -> f64 {
        self.value(storage_fraction)
    }
}

/// A two-dimensional lookup: one storage-fraction column per day of year.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalTable {
    grid: Vec<f64>,
    columns: Vec<Vec<f64>>,
}

impl SeasonalTable {
    /// `columns[d]` holds the flows for day of year `d + 1`.
    pub fn new(grid: Vec<f64>, columns: Vec<Vec<f64>>) -> Result<Self> {
        check_breakpoints(&grid)?;
        if columns.len() != DAYS_IN_TABLE {
            return Err(PolicyError::InvalidPolicySpec(format!(
                "seasonal table needs {} day columns, got {}",
                DAYS_IN_TABLE,
                columns.len()
            )));
        }
        for column in &columns {
            check_values(&grid, column)?;
        }
        Ok(SeasonalTable { grid, columns })
    }

    /// Sample `evaluator` for every day of year on a grid of the given
    /// resolution.
    pub fn tabulate(evaluator: &dyn PolicyEvaluator, resolution: f64) -> Result<Self> {
        let grid = storage_grid(resolution)?;
        let columns = (1..=DAYS_IN_TABLE as u32)
            .map(|day| grid.iter().map(|s| evaluator.evaluate(*s, Some(day))).collect())
            .collect();
        SeasonalTable::new(grid, columns)
    }

    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Flow at `storage_fraction` on the zero-based day `column`.
    pub fn value(&self, column: usize, storage_fraction: f64) -> f64 {
        interp(storage_fraction, &self.grid, &self.columns[column])
    }
}

impl PolicyEvaluator for SeasonalTable {
    /// Without a day of year the 1 January column is used.
    fn evaluate(&self, storage_fraction: f64, day_of_year: Option<u32>) -> f64 {
        let column = day_of_year
            .map_or(0, |day| (day.max(1) as usize - 1).min(DAYS_IN_TABLE - 1));
        self.value(column, storage_fraction)
    }
}

/// A seasonal table bound to the day-of-year column of every simulation step.
///
/// The table is shared, so binding the same policy to many runs is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalLookup {
    table: Arc<SeasonalTable>,
    day_index: Vec<usize>,
}

impl SeasonalLookup {
    /// `day_index[t]` is the zero-based column used at step `t`.
    pub fn new(table: Arc<SeasonalTable>, day_index: Vec<usize>) -> Result<Self> {
        if let Some(bad) = day_index.iter().find(|d| **d >= DAYS_IN_TABLE) {
            return Err(PolicyError::InvalidPolicySpec(format!(
                "day index {bad} outside the {DAYS_IN_TABLE}-day table"
            )));
        }
        Ok(SeasonalLookup { table, day_index })
    }

    /// Bind `table` to the calendar dates of a run.
    pub fn for_dates(table: Arc<SeasonalTable>, dates: &[chrono::NaiveDate]) -> Self {
        let day_index = dates.iter().map(rso_utils::dates::day_column).collect();
        SeasonalLookup { table, day_index }
    }

    pub fn table(&self) -> &SeasonalTable {
        &self.table
    }

    pub fn day_index(&self) -> &[usize] {
        &self.day_index
    }

    /// Number of steps this lookup is bound to.
    pub fn steps(&self) -> usize {
        self.day_index.len()
    }

    /// Flow at step `t` for `storage_fraction`.
    pub fn value(&self, t: usize, storage_fraction: f64) -> f64 {
        self.table.value(self.day_index[t], storage_fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Linear;

    impl PolicyEvaluator for Linear {
        fn evaluate(&self, storage_fraction: f64, day_of_year: Option<u32>) -> f64 {
            storage_fraction * 10.0 + day_of_year.unwrap_or(0) as f64
        }
    }

    #[test]
    fn test_static_lookup_clamps_outside_unit_interval() {
        let lookup = StaticLookup::new(vec![0.0, 0.5, 1.0], vec![2.0, 4.0, 8.0]).unwrap();
        assert_eq!(lookup.value(-0.2), 2.0);
        assert_eq!(lookup.value(1.3), 8.0);
        assert_eq!(lookup.value(0.75), 6.0);
    }

    #[test]
    fn test_static_lookup_rejects_bad_breakpoints() {
        assert!(StaticLookup::new(vec![0.0], vec![1.0]).is_err());
        assert!(StaticLookup::new(vec![0.1, 1.0], vec![1.0, 2.0]).is_err());
        assert!(StaticLookup::new(vec![0.0, 0.6, 0.4, 1.0], vec![1.0; 4]).is_err());
        assert!(StaticLookup::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(StaticLookup::new(vec![0.0, 1.0], vec![1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_tabulate_custom_evaluator() {
        let lookup = StaticLookup::tabulate(&Linear, 0.25).unwrap();
        assert_eq!(lookup.grid(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(lookup.values(), &[0.0, 2.5, 5.0, 7.5, 10.0]);
        assert!(StaticLookup::tabulate(&Linear, 0.3).is_err());
    }

    #[test]
    fn test_seasonal_table_tabulate() {
        let table = SeasonalTable::tabulate(&Linear, 0.5).unwrap();
        assert_eq!(table.columns().len(), DAYS_IN_TABLE);
        assert_eq!(table.value(0, 1.0), 11.0);
        assert_eq!(table.value(365, 0.0), 366.0);
        assert_eq!(table.evaluate(0.5, Some(32)), 37.0);
    }

    #[test]
    fn test_seasonal_lookup_day_index() {
        let table = Arc::new(SeasonalTable::tabulate(&Linear, 0.5).unwrap());
        assert!(SeasonalLookup::new(table.clone(), vec![0, 366]).is_err());

        let dates = [
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        ];
        let lookup = SeasonalLookup::for_dates(table, &dates);
        assert_eq!(lookup.day_index(), &[0, 365]);
        assert_eq!(lookup.value(1, 0.0), 366.0);
    }
}
