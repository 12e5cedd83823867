//! Crop heterogeneous rasters to their shared top-left extent.
//!
//! No resampling is done: every layer is assumed to share origin and pixel
//! size, so cropping to `[0..min_rows, 0..min_cols]` lines the grids up.
//! Inputs with different origins will be silently misregistered.

use tracing::{debug, warn};

use crate::error::{Result, SusceptibilityError};
use crate::raster::Raster;

/// Minimum `(rows, cols)` across all layers, or None for an empty set.
pub fn common_extent<'a>(layers: impl IntoIterator<Item = &'a Raster>) -> Option<(usize, usize)> {
    layers
        .into_iter()
        .map(Raster::shape)
        .reduce(|(r0, c0), (r1, c1)| (r0.min(r1), c0.min(c1)))
}

/// Crop every layer to the common extent. Order is preserved.
///
/// Layers already at the common extent are passed through unchanged.
pub fn align_layers(layers: Vec<Raster>) -> Result<Vec<Raster>> {
    let (rows, cols) = common_extent(&layers).ok_or(SusceptibilityError::EmptyInput("layers to align"))?;
    debug!(rows, cols, n = layers.len(), "aligning layers to common extent");

    Ok(layers
        .into_iter()
        .enumerate()
        .map(|(i, layer)| {
            if layer.shape() == (rows, cols) {
                layer
            } else {
                warn!(
                    layer = i,
                    from = ?layer.shape(),
                    to = ?(rows, cols),
                    "cropping layer to common extent"
                );
                layer.crop(rows, cols)
            }
        })
        .collect())
}
