//! Colour-mapped PNG rendering with a fixed value scale and a colourbar.
use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use landslide_core::Raster;

/// Gap between the map and the colourbar, in pixels.
const BAR_GAP: u32 = 4;
const NAN_COLOR: [u8; 3] = [255, 255, 255];

// Low → high susceptibility: green, pale yellow, red.
const RAMP: [[f32; 3]; 3] = [
    [26.0, 152.0, 80.0],
    [255.0, 255.0, 191.0],
    [215.0, 48.0, 39.0],
];

/// Value → RGB on the green-yellow-red ramp. Values outside
/// `[vmin, vmax]` are clamped; NaN is white.
pub fn colorize(v: f32, vmin: f32, vmax: f32) -> [u8; 3] {
    if v.is_nan() {
        return NAN_COLOR;
    }
    let t = ((v - vmin) / (vmax - vmin)).clamp(0.0, 1.0) * (RAMP.len() - 1) as f32;
    let i = (t.floor() as usize).min(RAMP.len() - 2);
    let f = t - i as f32;
    let (a, b) = (RAMP[i], RAMP[i + 1]);
    [0, 1, 2].map(|k| (a[k] + (b[k] - a[k]) * f).round() as u8)
}

/// Colourbar width for a map `width` pixels wide.
fn bar_width(width: u32) -> u32 {
    (width / 20).max(8)
}

/// Render the map with a vertical colourbar on its right (vmax at the top).
pub fn render(raster: &Raster, vmin: f32, vmax: f32) -> RgbImage {
    let (w, h) = (raster.width as u32, raster.height as u32);
    let bar = bar_width(w);
    let mut img = RgbImage::from_pixel(w + BAR_GAP + bar, h, Rgb(NAN_COLOR));

    for r in 0..raster.height {
        for c in 0..raster.width {
            img.put_pixel(c as u32, r as u32, Rgb(colorize(raster.get(r, c), vmin, vmax)));
        }
    }

    for y in 0..h {
        let t = if h > 1 { 1.0 - y as f32 / (h - 1) as f32 } else { 1.0 };
        let px = Rgb(colorize(vmin + t * (vmax - vmin), vmin, vmax));
        for x in (w + BAR_GAP)..(w + BAR_GAP + bar) {
            img.put_pixel(x, y, px);
        }
    }
    img
}

/// Render and save as PNG.
pub fn render_png(path: &Path, raster: &Raster, vmin: f32, vmax: f32) -> Result<()> {
    render(raster, vmin, vmax)
        .save(path)
        .with_context(|| format!("Failed to save {}", path.display()))
}
