//! Input file layout and loading.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use landslide_core::{PrecipitationDay, RunConfig, ScenarioInputs, VariableLayer};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::geotiff::{read_raster, GeoReference};

/// File names relative to the data directory.
/// Variable layers are read from `<variable name>.tif`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFiles {
    pub base_map: String,
    /// One file per day, in day order (day 1 first).
    pub precipitation: Vec<String>,
    pub land_use: String,
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            base_map: "base_susceptibility.tif".into(),
            precipitation: (1..=3).map(|d| format!("precipitation_day{d}.tif")).collect(),
            land_use: "lulc.tif".into(),
        }
    }
}

/// Contents of the `--config` JSON file: run parameters plus `inputs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    #[serde(flatten)]
    pub run: RunConfig,
    pub inputs: InputFiles,
}

impl ToolConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

fn load(path: &Path) -> Result<(landslide_core::Raster, GeoReference)> {
    let (raster, georef) = read_raster(path)?;
    info!("Loaded {} ({} x {})", path.display(), raster.width, raster.height);
    Ok((raster, georef))
}

/// Read every input raster and crop them to a shared extent.
///
/// Returns the base map's georeferencing alongside, for output GeoTIFFs.
/// The first missing file aborts the load.
pub fn load_inputs(data_dir: &Path, files: &InputFiles, run: &RunConfig) -> Result<(ScenarioInputs, GeoReference)> {
    let (base, reference) = load(&data_dir.join(&files.base_map))?;

    let variables = run
        .variables
        .iter()
        .map(|name| -> Result<VariableLayer> {
            let (raster, _) = load(&data_dir.join(format!("{name}.tif")))?;
            Ok(VariableLayer::new(name.clone(), raster))
        })
        .collect::<Result<Vec<_>>>()?;

    let precipitation = files
        .precipitation
        .iter()
        .enumerate()
        .map(|(i, file)| -> Result<PrecipitationDay> {
            let (raster, _) = load(&data_dir.join(file))?;
            Ok(PrecipitationDay { day: i + 1, raster })
        })
        .collect::<Result<Vec<_>>>()?;

    let (land_use, _) = load(&data_dir.join(&files.land_use))?;

    let inputs = ScenarioInputs::aligned(base, variables, precipitation, land_use)?;
    let (rows, cols) = inputs.shape();
    info!("Aligned inputs to {rows} x {cols}");
    Ok((inputs, reference))
}
