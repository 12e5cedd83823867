//! Landslide susceptibility under climate scenarios.
//!
//! Combines a base susceptibility raster with weighted, normalized terrain
//! predictors and log-scaled daily rainfall, per IPCC pathway, and tabulates
//! per-variable importance and per-land-use influence.
//!
//! File formats live in the `susceptibility` tool; this crate only sees
//! in-memory [`raster::Raster`] grids.

pub mod align;
pub mod config;
pub mod error;
pub mod importance;
pub mod land_use;
pub mod normalize;
pub mod raster;
pub mod scenario;
pub mod susceptibility;

pub use config::{ClimateScenario, RunConfig};
pub use error::{Result, SusceptibilityError};
pub use raster::Raster;
pub use scenario::{MapSink, PrecipitationDay, RunOutput, ScenarioDriver, ScenarioInputs};
pub use susceptibility::{calc_susceptibility, VariableLayer};
