//! Synthesis configuration

use crate::error::{HologramError, HologramResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default lattice resolution per axis.
pub const DEFAULT_RESOLUTION: usize = 40;

/// Default frequency-scale bounds.
pub const DEFAULT_SCALE_LOW: f32 = 0.5;
pub const DEFAULT_SCALE_HIGH: f32 = 2.0;

/// Floor added to slice norms so silent channels do not divide by zero.
pub const DEFAULT_EPSILON: f32 = 1e-6;

/// Configuration for one hologram synthesis run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HologramConfig {
    /// Voxels per lattice axis.
    pub resolution: usize,

    /// Cap on synthesized time-steps (`None` = all).
    pub max_steps: Option<usize>,

    /// Wavefront scale for the lowest frequency bin.
    pub scale_low: f32,

    /// Wavefront scale for the highest frequency bin.
    pub scale_high: f32,

    /// Norm floor used by spectral normalization.
    pub epsilon: f32,
}

impl HologramConfig {
    /// Create a configuration with the given resolution and default bounds.
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution,
            ..Self::default()
        }
    }

    /// Cap the time axis. Any negative value (conventionally -1) means "all".
    pub fn with_max_steps(mut self, max_steps: i64) -> Self {
        self.max_steps = usize::try_from(max_steps).ok();
        self
    }

    /// Set the frequency-scale bounds.
    pub fn with_scale(mut self, low: f32, high: f32) -> Self {
        self.scale_low = low;
        self.scale_high = high;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Voxels in one frame (R³).
    pub fn voxels_per_frame(&self) -> usize {
        self.resolution.pow(3)
    }

    /// Number of time-steps kept from an input of `available` steps.
    pub fn kept_steps(&self, available: usize) -> usize {
        self.max_steps.map_or(available, |cap| cap.min(available))
    }

    /// Validate configuration.
    pub fn validate(&self) -> HologramResult<()> {
        if self.resolution == 0 {
            return Err(HologramError::InvalidResolution);
        }
        if !(self.scale_low.is_finite() && self.scale_high.is_finite()) {
            return Err(HologramError::InvalidScale {
                low: self.scale_low,
                high: self.scale_high,
            });
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(HologramError::InvalidEpsilon(self.epsilon));
        }
        Ok(())
    }
}

impl Default for HologramConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            max_steps: None,
            scale_low: DEFAULT_SCALE_LOW,
            scale_high: DEFAULT_SCALE_HIGH,
            epsilon: DEFAULT_EPSILON,
        }
    }
}
