//! Scenario driver: climate pathways × precipitation days.
//!
//! Two passes over every (scenario, day) pair:
//!   1. importance: perturb rainfall, pick per-day weights, compute and emit
//!      the susceptibility map, tabulate per-variable importance.
//!   2. influence: perturb rainfall again (fresh draw), recompute the map
//!      with the weight vector carried out of pass 1, tabulate mean
//!      susceptibility per LULC class.
//!
//! A pair whose final surface has no value range (a dry day, for example)
//! is logged and skipped: no map is emitted and no influence is recorded
//! for it. Importance records do not depend on the map and are kept.
//!
//! Pass 2 uses the weights of the *last* pair of pass 1 for every pair; the
//! vector is passed explicitly as `carried_weights`.
use rand::Rng;
use tracing::{debug, info, warn};

use crate::align::align_layers;
use crate::config::{ClimateScenario, RunConfig};
use crate::error::{Result, SusceptibilityError};
use crate::importance::{variable_importance, ImportanceRecord, ImportanceTable, InfluenceRecord, InfluenceTable};
use crate::land_use::class_influence;
use crate::raster::Raster;
use crate::susceptibility::{combine_prepared, effective_weights, prepare_variables, VariableLayer, SURFACE_LAYER};

/// One day's rainfall raster. `day` is 1-based and used in output names.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecipitationDay {
    pub day: usize,
    pub raster: Raster,
}

/// All rasters needed for a run, cropped to one shared extent.
#[derive(Debug, Clone)]
pub struct ScenarioInputs {
    pub base: Raster,
    pub variables: Vec<VariableLayer>,
    pub precipitation: Vec<PrecipitationDay>,
    pub land_use: Raster,
}

impl ScenarioInputs {
    /// Crop every layer to the smallest common `(rows, cols)` extent.
    pub fn aligned(
        base: Raster,
        variables: Vec<VariableLayer>,
        precipitation: Vec<PrecipitationDay>,
        land_use: Raster,
    ) -> Result<Self> {
        if precipitation.is_empty() {
            return Err(SusceptibilityError::EmptyInput("precipitation days"));
        }
        let names: Vec<String> = variables.iter().map(|v| v.name.clone()).collect();
        let days: Vec<usize> = precipitation.iter().map(|p| p.day).collect();
        let n_vars = variables.len();

        let mut layers = Vec::with_capacity(2 + n_vars + days.len());
        layers.push(base);
        layers.extend(variables.into_iter().map(|v| v.raster));
        layers.extend(precipitation.into_iter().map(|p| p.raster));
        layers.push(land_use);

        let mut aligned = align_layers(layers)?.into_iter();
        // Order above is fixed, so every `next()` is present.
        let mut take = || aligned.next().ok_or(SusceptibilityError::EmptyInput("aligned layers"));
        let base = take()?;
        let variables = names
            .into_iter()
            .map(|name| -> Result<VariableLayer> { Ok(VariableLayer::new(name, take()?)) })
            .collect::<Result<Vec<_>>>()?;
        let precipitation = days
            .into_iter()
            .map(|day| -> Result<PrecipitationDay> { Ok(PrecipitationDay { day, raster: take()? }) })
            .collect::<Result<Vec<_>>>()?;
        let land_use = take()?;

        Ok(Self { base, variables, precipitation, land_use })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.base.shape()
    }
}

/// Receives each susceptibility map from the importance pass.
pub trait MapSink {
    type Error: From<SusceptibilityError>;

    fn emit(&mut self, scenario: &ClimateScenario, day: usize, map: &Raster) -> std::result::Result<(), Self::Error>;
}

/// Accumulated tables plus the weight vector handed to the influence pass.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub importance: ImportanceTable,
    pub influence: InfluenceTable,
    pub carried_weights: Vec<f32>,
}

/// Base file stem for a (scenario, day) map: `susceptibility_map_<scenario>_day<day>`.
pub fn output_stem(scenario: &str, day: usize) -> String {
    format!("susceptibility_map_{scenario}_day{day}")
}

/// `layer · (factor + draw)`.
pub fn perturb_precipitation(layer: &Raster, factor: f32, draw: f32) -> Raster {
    let scale = factor + draw;
    layer.map(|v| v * scale)
}

/// Uniform draw in `[-jitter, jitter]`; exactly zero when `jitter == 0`.
pub fn jitter_draw<R: Rng>(rng: &mut R, jitter: f32) -> f32 {
    if jitter > 0.0 {
        rng.gen_range(-jitter..=jitter)
    } else {
        0.0
    }
}

/// A flat final surface becomes None; every other error passes through.
fn surface_or_skip(result: Result<Raster>) -> Result<Option<Raster>> {
    match result {
        Ok(map) => Ok(Some(map)),
        Err(SusceptibilityError::DegenerateRange { layer }) if layer == SURFACE_LAYER => Ok(None),
        Err(e) => Err(e),
    }
}

pub struct ScenarioDriver<'a> {
    config: &'a RunConfig,
}

impl<'a> ScenarioDriver<'a> {
    pub fn new(config: &'a RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run both passes. Maps from the importance pass go to `sink`.
    pub fn run<S, R>(&self, inputs: &ScenarioInputs, sink: &mut S, rng: &mut R) -> std::result::Result<RunOutput, S::Error>
    where
        S: MapSink,
        R: Rng,
    {
        if inputs.variables.len() != self.config.weights.len() {
            return Err(SusceptibilityError::WeightCountMismatch {
                weights: self.config.weights.len(),
                layers: inputs.variables.len(),
            }
            .into());
        }
        let prepared = prepare_variables(&inputs.variables)?;

        let (importance, carried_weights) = self.importance_pass(inputs, &prepared, sink, rng)?;
        let influence = self.influence_pass(inputs, &prepared, &carried_weights, rng)?;

        info!(
            importance_records = importance.len(),
            influence_records = influence.len(),
            "scenario run complete"
        );
        Ok(RunOutput { importance, influence, carried_weights })
    }

    /// Returns the importance table and the weights used for the final pair.
    pub fn importance_pass<S, R>(
        &self,
        inputs: &ScenarioInputs,
        prepared: &[Raster],
        sink: &mut S,
        rng: &mut R,
    ) -> std::result::Result<(ImportanceTable, Vec<f32>), S::Error>
    where
        S: MapSink,
        R: Rng,
    {
        let cfg = self.config;
        let means = prepared
            .iter()
            .zip(&inputs.variables)
            .map(|(p, v)| {
                p.mean()
                    .ok_or_else(|| SusceptibilityError::DegenerateRange { layer: v.name.clone() })
            })
            .collect::<Result<Vec<f64>>>()?;

        let mut table = ImportanceTable::new();
        let mut carried = cfg.weights.clone();

        for scenario in &cfg.scenarios {
            for precip in &inputs.precipitation {
                let draw = jitter_draw(rng, cfg.jitter);
                let perturbed = perturb_precipitation(&precip.raster, scenario.factor, draw);
                let peak = perturbed.finite_max().unwrap_or(f32::NEG_INFINITY);
                let weights = effective_weights(&cfg.weights, peak, cfg.extreme_threshold, cfg.extreme_multiplier);
                let extreme = peak > cfg.extreme_threshold;
                info!(
                    scenario = %scenario.name,
                    day = precip.day,
                    jitter = draw,
                    peak,
                    extreme,
                    "computing susceptibility"
                );

                match surface_or_skip(combine_prepared(&inputs.base, prepared, &perturbed, &weights))? {
                    Some(map) => sink.emit(scenario, precip.day, &map)?,
                    None => warn!(
                        scenario = %scenario.name,
                        day = precip.day,
                        "susceptibility surface is flat, skipping map"
                    ),
                }

                for ((variable, &w), &mean) in inputs.variables.iter().zip(&cfg.weights).zip(&means) {
                    table.push(ImportanceRecord {
                        scenario: scenario.name.clone(),
                        day: precip.day,
                        variable: variable.name.clone(),
                        importance: variable_importance(w, mean, scenario.factor),
                    });
                }
                carried = weights;
            }
        }
        Ok((table, carried))
    }

    /// Per-class mean susceptibility using `carried_weights` for every pair.
    pub fn influence_pass<R>(
        &self,
        inputs: &ScenarioInputs,
        prepared: &[Raster],
        carried_weights: &[f32],
        rng: &mut R,
    ) -> Result<InfluenceTable>
    where
        R: Rng,
    {
        let cfg = self.config;
        let mut table = InfluenceTable::new();

        for scenario in &cfg.scenarios {
            for precip in &inputs.precipitation {
                let draw = jitter_draw(rng, cfg.jitter);
                let perturbed = perturb_precipitation(&precip.raster, scenario.factor, draw);
                let Some(map) = surface_or_skip(combine_prepared(&inputs.base, prepared, &perturbed, carried_weights))?
                else {
                    warn!(
                        scenario = %scenario.name,
                        day = precip.day,
                        "susceptibility surface is flat, skipping land-use influence"
                    );
                    continue;
                };

                for class in &cfg.land_use_classes {
                    match class_influence(&map, &inputs.land_use, class.code) {
                        Some(influence) => table.push(InfluenceRecord {
                            scenario: scenario.name.clone(),
                            day: precip.day,
                            lulc_class: class.label.clone(),
                            influence,
                        }),
                        None => debug!(
                            scenario = %scenario.name,
                            day = precip.day,
                            class = %class.label,
                            "class absent from land-use map"
                        ),
                    }
                }
            }
        }
        Ok(table)
    }
}
