//! Layer rescaling: min-max to [0, 1] and log1p for skewed rainfall.
use crate::error::{Result, SusceptibilityError};
use crate::raster::Raster;

/// Min-max rescale to [0, 1]: `(v − min) / (max − min)`.
///
/// Extremes are taken over finite cells; NaN cells stay NaN. A layer with
/// no spread (constant, or no finite cells) is rejected with
/// [`SusceptibilityError::DegenerateRange`] instead of yielding NaN/inf.
/// Negative values are not clamped here.
pub fn normalize(data: &Raster, layer: &str) -> Result<Raster> {
    let degenerate = || SusceptibilityError::DegenerateRange { layer: layer.to_string() };
    let min = data.finite_min().ok_or_else(degenerate)?;
    let max = data.finite_max().ok_or_else(degenerate)?;
    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        return Err(degenerate());
    }
    Ok(data.map(|v| (v - min) / range))
}

/// Element-wise `ln(1 + p)`. Fails on any finite value below −1.
pub fn normalize_precipitation(p: &Raster, layer: &str) -> Result<Raster> {
    if let Some(&value) = p.data.iter().find(|&&v| v < -1.0) {
        return Err(SusceptibilityError::InvalidPrecipitation { layer: layer.to_string(), value });
    }
    Ok(p.map(f32::ln_1p))
}

/// Zero negative cells on a copy, then min-max normalize.
/// This is the per-variable transform the calculator applies before weighting.
pub fn prepare_variable(v: &Raster, layer: &str) -> Result<Raster> {
    normalize(&v.clamp_negatives(), layer)
}
