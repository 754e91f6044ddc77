use crate::error::{Result, SimulationError};
use serde::{Deserialize, Serialize};

/// Surface area assumed when none is given, in km².
pub const DEFAULT_SURFACE_AREA: f64 = 1.0;

fn default_surface_area() -> f64 {
    DEFAULT_SURFACE_AREA
}

/// Static physical and regulatory limits of a reservoir.
///
/// Volumes share one unit (for example ML); evaporation depth times
/// `surface_area` must land in that unit (mm × km² = ML).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReservoirConfig {
    /// Dead storage: water below this level is never released.
    pub storage_min: f64,
    /// Capacity: anything above spills.
    pub storage_max: f64,
    /// Storage at the start of the first step.
    pub initial_storage: f64,
    /// Constant water surface area.
    #[serde(default = "default_surface_area")]
    pub surface_area: f64,
}

impl ReservoirConfig {
    pub fn new(storage_min: f64, storage_max: f64, initial_storage: f64) -> Self {
        ReservoirConfig {
            storage_min,
            storage_max,
            initial_storage,
            surface_area: DEFAULT_SURFACE_AREA,
        }
    }

    pub fn with_surface_area(mut self, surface_area: f64) -> Self {
        self.surface_area = surface_area;
        self
    }

    /// Check the limits are consistent.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("storage_min", self.storage_min),
            ("storage_max", self.storage_max),
            ("initial_storage", self.initial_storage),
            ("surface_area", self.surface_area),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(SimulationError::Configuration(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        if self.storage_min < 0.0 {
            return Err(SimulationError::Configuration(format!(
                "storage_min must not be negative, got {}",
                self.storage_min
            )));
        }
        if self.storage_max <= self.storage_min {
            return Err(SimulationError::Configuration(format!(
                "storage_max ({}) must exceed storage_min ({})",
                self.storage_max, self.storage_min
            )));
        }
        if self.initial_storage < self.storage_min || self.initial_storage > self.storage_max {
            return Err(SimulationError::Configuration(format!(
                "initial_storage ({}) outside [{}, {}]",
                self.initial_storage, self.storage_min, self.storage_max
            )));
        }
        if self.surface_area < 0.0 {
            return Err(SimulationError::Configuration(format!(
                "surface_area must not be negative, got {}",
                self.surface_area
            )));
        }
        Ok(())
    }
}

/// How ensemble members are scheduled. Both modes give bit-identical traces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    /// One rayon task per member.
    Parallel,
}

/// Run-time options that do not change results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOptions {
    #[serde(default)]
    pub execution: ExecutionMode,
}

impl SimulationOptions {
    pub fn parallel() -> Self {
        SimulationOptions {
            execution: ExecutionMode::Parallel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = ReservoirConfig::new(5.0, 100.0, 20.0);
        assert_eq!(config.surface_area, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inconsistent_bounds() {
        assert!(ReservoirConfig::new(100.0, 100.0, 100.0).validate().is_err());
        assert!(ReservoirConfig::new(50.0, 10.0, 20.0).validate().is_err());
        assert!(ReservoirConfig::new(-1.0, 10.0, 5.0).validate().is_err());
        assert!(ReservoirConfig::new(5.0, 100.0, 120.0).validate().is_err());
        assert!(ReservoirConfig::new(5.0, 100.0, 1.0).validate().is_err());
        assert!(ReservoirConfig::new(5.0, f64::NAN, 10.0).validate().is_err());
        assert!(ReservoirConfig::new(5.0, 100.0, 20.0)
            .with_surface_area(-2.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_deserialize_default_surface_area() {
        let config: ReservoirConfig = serde_json::from_str(
            r#"{"storage_min": 5, "storage_max": 100, "initial_storage": 20}"#,
        )
        .unwrap();
        assert_eq!(config, ReservoirConfig::new(5.0, 100.0, 20.0));
    }
}
