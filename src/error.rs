//! Error types for hologram synthesis

use thiserror::Error;

/// Result alias used throughout the crate.
pub type HologramResult<T> = Result<T, HologramError>;

/// Fatal errors. Recoverable degeneracies (flat bounding-box axes, silent
/// or non-finite spectral slices) are reported, never raised.
#[derive(Debug, Error)]
pub enum HologramError {
    #[error("resolution must be > 0")]
    InvalidResolution,
    #[error("frequency scale bounds must be finite (low={low}, high={high})")]
    InvalidScale { low: f32, high: f32 },
    #[error("epsilon must be positive and finite, got {0}")]
    InvalidEpsilon(f32),
    #[error("at least one sensor is required")]
    EmptyLayout,
    #[error("sensor {sensor} has a non-finite position")]
    NonFinitePosition { sensor: usize },
    #[error("shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("malformed array file: {0}")]
    Format(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HologramError {
    pub(crate) fn shape(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }
}
