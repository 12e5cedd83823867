//! Land-use / land-cover (LULC) class labels and per-class statistics.
use serde::{Deserialize, Serialize};

use crate::raster::Raster;

/// Integer LULC code with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandUseClass {
    pub code: i32,
    pub label: String,
}

impl LandUseClass {
    pub fn new(code: i32, label: impl Into<String>) -> Self {
        Self { code, label: label.into() }
    }
}

/// Standard legend. Code 4 is not reported.
pub fn default_classes() -> Vec<LandUseClass> {
    vec![
        LandUseClass::new(1, "Forest"),
        LandUseClass::new(2, "Agriculture"),
        LandUseClass::new(3, "Urban"),
        LandUseClass::new(5, "Pasture"),
    ]
}

/// Boolean mask of cells whose LULC value equals `code`.
pub fn class_mask(land_use: &Raster, code: i32) -> Vec<bool> {
    let target = code as f32;
    land_use.data.iter().map(|&v| v == target).collect()
}

/// Mean susceptibility over the cells of one LULC class.
///
/// Returns None when the class does not occur (or only on NaN cells).
/// `susceptibility` and `land_use` must share a shape.
pub fn class_influence(susceptibility: &Raster, land_use: &Raster, code: i32) -> Option<f64> {
    debug_assert_eq!(susceptibility.shape(), land_use.shape());
    let (sum, n) = susceptibility
        .data
        .iter()
        .zip(class_mask(land_use, code))
        .filter(|&(v, selected)| selected && v.is_finite())
        .fold((0.0f64, 0usize), |(s, n), (&v, _)| (s + v as f64, n + 1));
    if n == 0 { None } else { Some(sum / n as f64) }
}
