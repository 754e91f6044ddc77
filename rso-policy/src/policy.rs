use crate::lookup::{SeasonalLookup, StaticLookup};
use rso_utils::series::Series;

/// A resolved operating policy, ready for the simulation engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Policy {
    /// No policy: the engine falls back to its default for the channel.
    #[default]
    None,
    /// Flows given directly per step (and optionally per member).
    ExplicitSeries(Series),
    /// Flow as a function of storage fraction.
    StaticLookup(StaticLookup),
    /// Flow as a function of storage fraction and day of year.
    SeasonalLookup(SeasonalLookup),
}

impl Policy {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Policy::None => "none",
            Policy::ExplicitSeries(_) => "explicit series",
            Policy::StaticLookup(_) => "static lookup",
            Policy::SeasonalLookup(_) => "seasonal lookup",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Policy::None)
    }
}

impl From<StaticLookup> for Policy {
    fn from(lookup: StaticLookup) -> Self {
        Policy::StaticLookup(lookup)
    }
}

impl From<SeasonalLookup> for Policy {
    fn from(lookup: SeasonalLookup) -> Self {
        Policy::SeasonalLookup(lookup)
    }
}

impl From<Series> for Policy {
    fn from(series: Series) -> Self {
        Policy::ExplicitSeries(series)
    }
}
