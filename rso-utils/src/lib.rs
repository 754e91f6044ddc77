//! Shared utility functions for reservoir system operation crates.

pub mod series;

/// Date utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDate};

    /// Non-leap year used to resolve "day month" control-point dates.
    ///
    /// Control points never carry a year, so "1 Mar" is always day 60 and
    /// "29 Feb" is rejected.
    pub const REFERENCE_YEAR: i32 = 1900;

    /// Number of day-of-year columns in a seasonal table (leap years included).
    pub const DAYS_IN_TABLE: usize = 366;

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Day of the calendar year, 1 (Jan 1) to 366 (Dec 31 of a leap year).
    pub fn day_of_year(date: &NaiveDate) -> u32 {
        date.ordinal()
    }

    /// Zero-based seasonal table column for a simulation date.
    pub fn day_column(date: &NaiveDate) -> usize {
        date.ordinal0() as usize
    }

    /// Parse a year date such as "1 Apr" or "31 December" into its day of
    /// year within [`REFERENCE_YEAR`].
    pub fn parse_year_date(s: &str) -> anyhow::Result<u32> {
        let with_year = format!("{} {}", s.trim(), REFERENCE_YEAR);
        let date = NaiveDate::parse_from_str(&with_year, "%d %b %Y")?;
        Ok(date.ordinal())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        #[test]
        fn test_day_of_year() {
            let jan1 = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
            assert_eq!(day_of_year(&jan1), 1);
            assert_eq!(day_column(&jan1), 0);

            let dec31 = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
            assert_eq!(day_of_year(&dec31), 365);

            let leap_dec31 = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
            assert_eq!(day_of_year(&leap_dec31), 366);
            assert_eq!(day_column(&leap_dec31), 365);
        }

        #[test]
        fn test_parse_year_date() {
            assert_eq!(parse_year_date("1 Jan").unwrap(), 1);
            assert_eq!(parse_year_date("1 Apr").unwrap(), 91);
            assert_eq!(parse_year_date("1 Jul").unwrap(), 182);
            assert_eq!(parse_year_date("31 Dec").unwrap(), 365);
            assert_eq!(parse_year_date(" 1 Mar ").unwrap(), 60);
        }

        #[test]
        fn test_parse_year_date_rejects_leap_day() {
            assert!(parse_year_date("29 Feb").is_err());
            assert!(parse_year_date("Apr 1").is_err());
        }

        #[test]
        fn test_format_and_parse() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
            let formatted = format_date(&date);
            assert_eq!(formatted, "2023-06-15");
            let parsed = parse_date(&formatted).unwrap();
            assert_eq!(parsed, date);
        }
    }
}

/// Piecewise-linear interpolation over sorted breakpoints.
pub mod interpolation {
    /// Evaluate the piecewise-linear function through `(xp, fp)` at `x`.
    ///
    /// `xp` must be non-decreasing. Values outside `[xp[0], xp[n-1]]` are
    /// clamped to the boundary values. Where `xp` repeats, the function is
    /// right-continuous: the right-most duplicate wins. A NaN `x` yields NaN.
    pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
        debug_assert_eq!(xp.len(), fp.len());
        let n = xp.len();
        if n == 0 || x.is_nan() {
            return f64::NAN;
        }
        if x < xp[0] {
            return fp[0];
        }
        if x >= xp[n - 1] {
            return fp[n - 1];
        }
        // xp[j] <= x < xp[j + 1]
        let j = xp.partition_point(|v| *v <= x) - 1;
        let slope = (fp[j + 1] - fp[j]) / (xp[j + 1] - xp[j]);
        fp[j] + slope * (x - xp[j])
    }

    /// Evenly spaced samples on `[0, 1]` with the given step, inclusive of
    /// both ends. Returns `None` unless `step` is in `(0, 1]` and divides 1.
    pub fn unit_grid(step: f64) -> Option<Vec<f64>> {
        if !(step > 0.0 && step <= 1.0) {
            return None;
        }
        let intervals = (1.0 / step).round();
        if (intervals * step - 1.0).abs() > 1e-9 {
            return None;
        }
        let intervals = intervals as usize;
        let mut grid: Vec<f64> = (0..=intervals).map(|i| i as f64 * step).collect();
        grid[intervals] = 1.0;
        Some(grid)
    }

}

/// Error types
pub mod error {
    use std::fmt;

    /// A series could not be broadcast to the requested `[T, M]` shape.
    #[derive(Debug, Clone, PartialEq)]
    pub struct ShapeError {
        pub expected: (usize, usize),
        pub found: (usize, usize),
    }

    impl fmt::Display for ShapeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "Shape error: cannot broadcast [{}, {}] to [{}, {}]",
                self.found.0, self.found.1, self.expected.0, self.expected.1
            )
        }
    }

    impl std::error::Error for ShapeError {}
}
