//! Layout configuration.
//!
//! Every field is validated once, before the first step; a bad value fails
//! fast instead of being silently defaulted mid-run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};

/// Configuration for a force-directed layout run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Canvas width in layout units.
    #[serde(default = "default_dimension")]
    pub width: f64,
    /// Canvas height in layout units.
    #[serde(default = "default_dimension")]
    pub height: f64,
    /// Hard cap on steps before forced termination.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Barnes-Hut accuracy/performance tradeoff; `0.0` is exact O(n²).
    #[serde(default = "default_theta")]
    pub theta: f64,
    /// Scales the derived attraction constant.
    #[serde(default = "default_multiplier")]
    pub attraction_multiplier: f64,
    /// Scales the derived repulsion constant.
    #[serde(default = "default_multiplier")]
    pub repulsion_multiplier: f64,
    /// Seed for the initial scatter and the boundary jitter, for
    /// reproducible runs.
    #[serde(default)]
    pub random_seed: u64,
    /// Delay between relaxer iterations, in milliseconds.
    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u64,
}

fn default_dimension() -> f64 {
    600.0
}

fn default_max_iterations() -> usize {
    700
}

fn default_theta() -> f64 {
    0.5
}

fn default_multiplier() -> f64 {
    0.75
}

fn default_step_interval_ms() -> u64 {
    0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: default_dimension(),
            height: default_dimension(),
            max_iterations: default_max_iterations(),
            theta: default_theta(),
            attraction_multiplier: default_multiplier(),
            repulsion_multiplier: default_multiplier(),
            random_seed: 0,
            step_interval_ms: default_step_interval_ms(),
        }
    }
}

impl LayoutConfig {
    /// Validate all fields. Called by the algorithm at initialization.
    pub fn validate(&self) -> LayoutResult<()> {
        if !(self.width > 0.0 && self.height > 0.0)
            || !self.width.is_finite()
            || !self.height.is_finite()
        {
            return Err(LayoutError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.max_iterations == 0 {
            return Err(LayoutError::InvalidConfig {
                field: "max_iterations",
                value: self.max_iterations.to_string(),
                reason: "must be greater than zero",
            });
        }
        if !(self.theta >= 0.0) || !self.theta.is_finite() {
            return Err(LayoutError::InvalidConfig {
                field: "theta",
                value: self.theta.to_string(),
                reason: "must be finite and >= 0",
            });
        }
        if !(self.attraction_multiplier > 0.0) {
            return Err(LayoutError::InvalidConfig {
                field: "attraction_multiplier",
                value: self.attraction_multiplier.to_string(),
                reason: "must be greater than zero",
            });
        }
        if !(self.repulsion_multiplier > 0.0) {
            return Err(LayoutError::InvalidConfig {
                field: "repulsion_multiplier",
                value: self.repulsion_multiplier.to_string(),
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }

    /// The relaxer's inter-step delay.
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(LayoutConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let with = |f: fn(&mut LayoutConfig)| {
            let mut config = LayoutConfig::default();
            f(&mut config);
            config.validate()
        };

        assert!(matches!(
            with(|c| c.width = 0.0),
            Err(LayoutError::InvalidDimensions { .. })
        ));
        assert!(with(|c| c.height = -10.0).is_err());
        assert!(with(|c| c.max_iterations = 0).is_err());
        assert!(with(|c| c.theta = -0.1).is_err());
        assert!(with(|c| c.theta = f64::NAN).is_err());
        assert!(with(|c| c.attraction_multiplier = 0.0).is_err());
        assert!(with(|c| c.repulsion_multiplier = -1.0).is_err());
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let config: LayoutConfig = serde_json::from_str(r#"{"theta": 0.8}"#).unwrap();
        assert_eq!(config.theta, 0.8);
        assert_eq!(config.max_iterations, 700);
        assert_eq!(config.width, 600.0);
        assert!(config.validate().is_ok());
    }
}
