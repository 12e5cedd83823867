use serde::{Deserialize, Serialize};

/// A single-band 2D grid of f32 values, row-major.
/// Spatial reference (CRS, affine transform) is carried by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster {
    /// Row-major cell values; NaN marks nodata.
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

impl Raster {
    /// Create a new Raster filled with the given value.
    pub fn new(width: usize, height: usize, fill: f32) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
        }
    }

    /// Wrap an existing row-major buffer. `data.len()` must equal `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), width * height, "buffer does not match {width}x{height}");
        Self { data, width, height }
    }

    /// `(rows, cols)`, matching the usual raster shape convention.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f32) {
        self.data[row * self.width + col] = val;
    }

    /// Top-left window of `rows × cols` cells. Panics if larger than the raster.
    pub fn crop(&self, rows: usize, cols: usize) -> Raster {
        assert!(rows <= self.height && cols <= self.width, "crop exceeds raster extent");
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            let start = r * self.width;
            data.extend_from_slice(&self.data[start..start + cols]);
        }
        Raster { data, width: cols, height: rows }
    }

    /// Copy with every negative cell set to zero. NaN cells are kept.
    pub fn clamp_negatives(&self) -> Raster {
        self.map(|v| if v < 0.0 { 0.0 } else { v })
    }

    /// Apply `f` to every cell, returning a new raster of the same shape.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Raster {
        Raster {
            data: self.data.iter().map(|&v| f(v)).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Smallest finite value, or None if the raster has no finite cells.
    pub fn finite_min(&self) -> Option<f32> {
        self.data.iter().cloned().filter(|v| v.is_finite()).reduce(f32::min)
    }

    /// Largest finite value, or None if the raster has no finite cells.
    pub fn finite_max(&self) -> Option<f32> {
        self.data.iter().cloned().filter(|v| v.is_finite()).reduce(f32::max)
    }

    /// Arithmetic mean over finite cells, accumulated in f64.
    pub fn mean(&self) -> Option<f64> {
        let (sum, n) = self
            .data
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0f64, 0usize), |(s, n), &v| (s + v as f64, n + 1));
        if n == 0 { None } else { Some(sum / n as f64) }
    }
}
