//! Sensor layout - ordered, immutable 3D sensor positions
//!
//! The index of a sensor in its layout is the canonical sensor id used by
//! every downstream stage (distance volumes, spectral rows, grid cells).

use crate::error::{HologramError, HologramResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A fixed, 3D-located measurement channel.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sensor {
    /// Canonical sensor id.
    pub index: usize,
    /// Position in arbitrary physical units.
    pub position: [f32; 3],
}

/// Axis-aligned bounding box of all sensor positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox {
    /// Extent per axis (`max - min`).
    pub fn extent(&self) -> [f32; 3] {
        [0usize, 1, 2].map(|axis| self.max[axis] - self.min[axis])
    }

    /// Axes whose extent is zero.
    pub fn flat_axes(&self) -> [bool; 3] {
        self.extent().map(|e| e == 0.0)
    }

    /// Geometric center.
    pub fn center(&self) -> [f32; 3] {
        [0usize, 1, 2].map(|axis| (self.min[axis] + self.max[axis]) * 0.5)
    }
}

/// Ordered collection of sensors. Never mutated once built.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorLayout {
    sensors: Vec<Sensor>,
}

impl SensorLayout {
    /// Build a layout from positions; order defines sensor ids.
    pub fn from_positions<I>(positions: I) -> HologramResult<Self>
    where
        I: IntoIterator<Item = [f32; 3]>,
    {
        let sensors: Vec<Sensor> = positions
            .into_iter()
            .enumerate()
            .map(|(index, position)| Sensor { index, position })
            .collect();

        if sensors.is_empty() {
            return Err(HologramError::EmptyLayout);
        }
        if let Some(bad) = sensors
            .iter()
            .find(|s| s.position.iter().any(|c| !c.is_finite()))
        {
            return Err(HologramError::NonFinitePosition { sensor: bad.index });
        }

        Ok(Self { sensors })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sensor> {
        self.sensors.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors.iter()
    }

    /// Axis-wise min/max over all positions.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for sensor in &self.sensors {
            for axis in 0..3 {
                min[axis] = min[axis].min(sensor.position[axis]);
                max[axis] = max[axis].max(sensor.position[axis]);
            }
        }
        BoundingBox { min, max }
    }
}
