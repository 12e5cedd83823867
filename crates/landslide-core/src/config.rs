//! Run parameters. Defaults reproduce the standard four-pathway analysis;
//! every field can be overridden from JSON (missing fields keep their default).
use serde::{Deserialize, Serialize};

use crate::error::{Result, SusceptibilityError};
use crate::land_use::{default_classes, LandUseClass};

/// Named climate-forcing pathway and its precipitation scaling factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateScenario {
    pub name: String,
    pub factor: f32,
}

impl ClimateScenario {
    pub fn new(name: impl Into<String>, factor: f32) -> Self {
        Self { name: name.into(), factor }
    }
}

/// IPCC pathways RCP2.6 through RCP8.5.
pub fn default_scenarios() -> Vec<ClimateScenario> {
    vec![
        ClimateScenario::new("RCP2.6", 1.05),
        ClimateScenario::new("RCP4.5", 1.10),
        ClimateScenario::new("RCP6.0", 1.15),
        ClimateScenario::new("RCP8.5", 1.25),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Predictor names, in weight order.
    pub variables: Vec<String>,
    /// One weight per predictor.
    pub weights: Vec<f32>,
    pub scenarios: Vec<ClimateScenario>,
    pub land_use_classes: Vec<LandUseClass>,
    /// Perturbed daily maximum above which weights are escalated.
    pub extreme_threshold: f32,
    pub extreme_multiplier: f32,
    /// Half-width of the uniform jitter added to each scenario factor.
    pub jitter: f32,
    /// Fixed RNG seed; None draws from OS entropy.
    pub seed: Option<u64>,
    /// Colour scale (vmin, vmax) for rendered maps.
    pub color_range: (f32, f32),
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            variables: [
                "slope",
                "aspect",
                "curvature",
                "geology",
                "distance_to_rivers",
                "distance_to_roads",
                "ndvi",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            weights: vec![0.25, 0.10, 0.10, 0.20, 0.15, 0.10, 0.10],
            scenarios: default_scenarios(),
            land_use_classes: default_classes(),
            extreme_threshold: 500.0,
            extreme_multiplier: 1.5,
            jitter: 0.2,
            seed: None,
            color_range: (0.0, 1.0),
        }
    }
}

impl RunConfig {
    /// Reject configurations the driver cannot run.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SusceptibilityError::InvalidConfig(msg));
        if self.weights.len() != self.variables.len() {
            return Err(SusceptibilityError::WeightCountMismatch {
                weights: self.weights.len(),
                layers: self.variables.len(),
            });
        }
        if self.scenarios.is_empty() {
            return Err(SusceptibilityError::EmptyInput("climate scenarios"));
        }
        if !(self.jitter >= 0.0 && self.jitter.is_finite()) {
            return invalid(format!("jitter must be a finite value >= 0, got {}", self.jitter));
        }
        if let Some(s) = self.scenarios.iter().find(|s| !s.factor.is_finite()) {
            return invalid(format!("scenario {} has non-finite factor {}", s.name, s.factor));
        }
        let (vmin, vmax) = self.color_range;
        if vmin >= vmax {
            return invalid(format!("color range ({vmin}, {vmax}) is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.variables.len(), 7);
        assert_eq!(cfg.weights.len(), 7);
        assert_eq!(cfg.scenarios.len(), 4);
        assert_eq!(cfg.extreme_threshold, 500.0);
        assert_eq!(cfg.jitter, 0.2);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = serde_json::from_str::<RunConfig>(r#"{ "seed": 7, "jitter": 0.0 }"#).unwrap();
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.jitter, 0.0);
        assert_eq!(cfg.scenarios, default_scenarios());
    }

    #[test]
    fn validate_rejects_bad_configs() {
        let cfg = RunConfig { weights: vec![1.0], ..RunConfig::default() };
        assert!(matches!(cfg.validate(), Err(SusceptibilityError::WeightCountMismatch { .. })));

        let cfg = RunConfig { scenarios: Vec::new(), ..RunConfig::default() };
        assert!(cfg.validate().is_err());

        let cfg = RunConfig { jitter: -0.1, ..RunConfig::default() };
        assert!(matches!(cfg.validate(), Err(SusceptibilityError::InvalidConfig(_))));

        let cfg = RunConfig { color_range: (1.0, 0.0), ..RunConfig::default() };
        assert!(cfg.validate().is_err());
    }
}
