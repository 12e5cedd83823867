use thiserror::Error;

/// Failures raised by the susceptibility pipeline.
#[derive(Debug, Error, PartialEq)]
pub enum SusceptibilityError {
    /// Min-max normalization needs at least two distinct finite values.
    #[error("layer `{layer}` has no value range to normalize (min == max or no finite cells)")]
    DegenerateRange { layer: String },

    /// log1p is only defined for values >= -1.
    #[error("precipitation layer `{layer}` contains {value}, below the log1p domain")]
    InvalidPrecipitation { layer: String, value: f32 },

    #[error("layer `{layer}` is {found:?} (rows, cols), expected {expected:?}")]
    ShapeMismatch {
        layer: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("{weights} weights supplied for {layers} variable layers")]
    WeightCountMismatch { weights: usize, layers: usize },

    #[error("no {0} supplied")]
    EmptyInput(&'static str),

    #[error("invalid run configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SusceptibilityError>;
