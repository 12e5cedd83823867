//! Weighted-overlay susceptibility surface.
//!
//! Pipeline per call:
//!   base map → + Σ wᵢ · normalize(max(Vᵢ, 0)) → × log1p(P) → max(·, 0) → normalize.
//!
//! Inputs are borrowed and never modified, so repeated calls with the same
//! layers return the same map.
use serde::{Deserialize, Serialize};

use crate::error::{Result, SusceptibilityError};
use crate::normalize::{normalize, normalize_precipitation, prepare_variable};
use crate::raster::Raster;

/// Layer name reported when the combined surface itself has no value range.
pub const SURFACE_LAYER: &str = "susceptibility";

/// One named predictor raster (slope, geology, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableLayer {
    pub name: String,
    pub raster: Raster,
}

impl VariableLayer {
    pub fn new(name: impl Into<String>, raster: Raster) -> Self {
        Self { name: name.into(), raster }
    }
}

/// Compute a [0, 1] susceptibility map.
///
/// `weights[i]` applies to `variables[i]`. All layers must share the base
/// map's shape; run them through [`crate::align::align_layers`] first.
pub fn calc_susceptibility(
    base: &Raster,
    variables: &[VariableLayer],
    precipitation: &Raster,
    weights: &[f32],
) -> Result<Raster> {
    let prepared = prepare_variables(variables)?;
    combine_prepared(base, &prepared, precipitation, weights)
}

/// Negative-zeroed, min-max normalized copies of each variable, in order.
pub fn prepare_variables(variables: &[VariableLayer]) -> Result<Vec<Raster>> {
    variables
        .iter()
        .map(|v| prepare_variable(&v.raster, &v.name))
        .collect()
}

/// The overlay steps of [`calc_susceptibility`] on variables that have
/// already been through [`prepare_variables`].
pub fn combine_prepared(
    base: &Raster,
    prepared: &[Raster],
    precipitation: &Raster,
    weights: &[f32],
) -> Result<Raster> {
    if weights.len() != prepared.len() {
        return Err(SusceptibilityError::WeightCountMismatch {
            weights: weights.len(),
            layers: prepared.len(),
        });
    }
    check_shape(base, precipitation, "precipitation")?;
    for (i, layer) in prepared.iter().enumerate() {
        check_shape(base, layer, &format!("variable {i}"))?;
    }

    let mut susc = base.clone();
    for (layer, &w) in prepared.iter().zip(weights) {
        for (s, &v) in susc.data.iter_mut().zip(&layer.data) {
            *s += w * v;
        }
    }

    let rain = normalize_precipitation(precipitation, "precipitation")?;
    for (s, &p) in susc.data.iter_mut().zip(&rain.data) {
        *s *= p;
    }

    normalize(&susc.clamp_negatives(), SURFACE_LAYER)
}

/// Weights in force for one precipitation day.
///
/// When the perturbed rainfall maximum exceeds `threshold` every weight is
/// scaled by `multiplier`; otherwise the base weights are returned as-is.
/// The escalation never carries over to the next day.
pub fn effective_weights(base_weights: &[f32], perturbed_max: f32, threshold: f32, multiplier: f32) -> Vec<f32> {
    if perturbed_max > threshold {
        base_weights.iter().map(|w| w * multiplier).collect()
    } else {
        base_weights.to_vec()
    }
}

fn check_shape(base: &Raster, layer: &Raster, name: &str) -> Result<()> {
    if layer.shape() != base.shape() {
        return Err(SusceptibilityError::ShapeMismatch {
            layer: name.to_string(),
            expected: base.shape(),
            found: layer.shape(),
        });
    }
    Ok(())
}
