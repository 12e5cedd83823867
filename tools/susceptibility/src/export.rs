//! Per-(scenario, day) map output and JSON table export.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use landslide_core::scenario::output_stem;
use landslide_core::{ClimateScenario, MapSink, Raster, RunOutput};
use tracing::info;

use crate::geotiff::{write_geotiff, GeoReference};
use crate::render::render_png;

/// Writes `<stem>.png` and/or `<stem>.tif` for every emitted map.
pub struct MapExporter {
    output_dir: PathBuf,
    reference: GeoReference,
    color_range: (f32, f32),
    png: bool,
    geotiff: bool,
    written: Vec<PathBuf>,
}

impl MapExporter {
    /// `reference` supplies the georeferencing copied into each GeoTIFF.
    pub fn new(output_dir: &Path, reference: GeoReference, color_range: (f32, f32)) -> Result<Self> {
        fs::create_dir_all(output_dir).with_context(|| format!("Cannot create {}", output_dir.display()))?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            reference,
            color_range,
            png: true,
            geotiff: true,
            written: Vec::new(),
        })
    }

    pub fn with_formats(mut self, png: bool, geotiff: bool) -> Self {
        self.png = png;
        self.geotiff = geotiff;
        self
    }

    /// Every file written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl MapSink for MapExporter {
    type Error = anyhow::Error;

    fn emit(&mut self, scenario: &ClimateScenario, day: usize, map: &Raster) -> Result<()> {
        let stem = output_stem(&scenario.name, day);
        if self.png {
            let path = self.output_dir.join(format!("{stem}.png"));
            let (vmin, vmax) = self.color_range;
            render_png(&path, map, vmin, vmax)?;
            info!("Wrote {}", path.display());
            self.written.push(path);
        }
        if self.geotiff {
            let path = self.output_dir.join(format!("{stem}.tif"));
            write_geotiff(&path, map, &self.reference)?;
            info!("Wrote {}", path.display());
            self.written.push(path);
        }
        Ok(())
    }
}

/// Write `importance.json` and `influence.json` into `dir`.
pub fn write_tables(dir: &Path, output: &RunOutput) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Cannot create {}", dir.display()))?;
    let importance = dir.join("importance.json");
    fs::write(&importance, serde_json::to_string_pretty(&output.importance)?)
        .with_context(|| format!("Write failed: {}", importance.display()))?;
    let influence = dir.join("influence.json");
    fs::write(&influence, serde_json::to_string_pretty(&output.influence)?)
        .with_context(|| format!("Write failed: {}", influence.display()))?;
    info!("Wrote {} and {}", importance.display(), influence.display());
    Ok(())
}
