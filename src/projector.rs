//! Grid projection - sensor positions to integer lattice cells
//!
//! Positions are normalized into [0, 1]³ against the layout's bounding box,
//! scaled by the resolution and truncated. Two edge conditions are defined:
//!
//! - **Flat axis**: an axis with zero extent uses extent 1, so every sensor
//!   lands on coordinate 0 along it. Reported, not fatal.
//! - **Upper bound**: truncation maps a sensor exactly on the maximum to
//!   index R, which is clamped to R - 1.

use crate::error::{HologramError, HologramResult};
use crate::sensor::SensorLayout;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Integer lattice coordinate, each component in `[0, resolution)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridCell {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl GridCell {
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn as_array(&self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }
}

/// Result of projecting a layout: one cell per sensor, in sensor order.
#[derive(Clone, Debug)]
pub struct Projection {
    pub cells: Vec<GridCell>,
    /// Axes that had zero extent and collapsed to coordinate 0.
    pub flat_axes: [bool; 3],
}

impl Projection {
    pub fn is_degenerate(&self) -> bool {
        self.flat_axes.iter().any(|&f| f)
    }
}

/// Maps sensor positions onto a cubic lattice.
#[derive(Clone, Copy, Debug)]
pub struct GridProjector {
    resolution: usize,
}

impl GridProjector {
    pub fn new(resolution: usize) -> HologramResult<Self> {
        if resolution == 0 {
            return Err(HologramError::InvalidResolution);
        }
        Ok(Self { resolution })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Project every sensor in the layout.
    pub fn project(&self, layout: &SensorLayout) -> Projection {
        let bbox = layout.bounding_box();
        let flat_axes = bbox.flat_axes();
        let extent = bbox.extent().map(|e| if e == 0.0 { 1.0 } else { e });

        for axis in (0..3usize).filter(|&axis| flat_axes[axis]) {
            log::warn!("[PROJECT] axis {} has zero extent; sensors collapse to 0", axis);
        }

        let cells = layout
            .iter()
            .map(|sensor| {
                let [x, y, z] = [0usize, 1, 2].map(|axis| {
                    let unit = (sensor.position[axis] - bbox.min[axis]) / extent[axis];
                    self.to_index(unit)
                });
                GridCell::new(x, y, z)
            })
            .collect();

        Projection { cells, flat_axes }
    }

    /// Scale a unit coordinate, truncate, clamp into range.
    #[inline]
    fn to_index(&self, unit: f32) -> usize {
        // `as` saturates negatives to 0
        let idx = (unit * self.resolution as f32) as usize;
        idx.min(self.resolution - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(positions: &[[f32; 3]]) -> SensorLayout {
        SensorLayout::from_positions(positions.iter().copied()).unwrap()
    }

    #[test]
    fn test_cells_in_range() {
        let sensors = layout(&[
            [-0.09, 0.02, 0.04],
            [0.08, -0.11, 0.10],
            [0.01, 0.07, -0.03],
            [0.03, 0.00, 0.01],
            [-0.02, 0.09, 0.07],
        ]);
        for resolution in [1, 2, 7, 40] {
            let projection = GridProjector::new(resolution).unwrap().project(&sensors);
            assert_eq!(projection.cells.len(), 5);
            assert!(!projection.is_degenerate());
            for cell in &projection.cells {
                assert!(cell.as_array().iter().all(|&c| c < resolution));
            }
        }
    }

    #[test]
    fn test_max_corner_clamped() {
        let sensors = layout(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
        let projection = GridProjector::new(4).unwrap().project(&sensors);

        assert_eq!(projection.cells[0], GridCell::new(0, 0, 0));
        // Truncation alone would give index 4 here
        assert_eq!(projection.cells[1], GridCell::new(3, 3, 3));
    }

    #[test]
    fn test_center_maps_to_central_cell() {
        let sensors = layout(&[[0.0, 0.0, 0.0], [10.0, 10.0, 10.0], [5.0, 5.0, 5.0]]);
        let projection = GridProjector::new(5).unwrap().project(&sensors);
        assert_eq!(projection.cells[2], GridCell::new(2, 2, 2));
    }

    #[test]
    fn test_flat_axis_collapses_to_zero() {
        let sensors = layout(&[[0.0, 3.0, 0.0], [1.0, 3.0, 0.5], [0.5, 3.0, 1.0]]);
        let projection = GridProjector::new(8).unwrap().project(&sensors);

        assert_eq!(projection.flat_axes, [false, true, false]);
        assert!(projection.cells.iter().all(|c| c.y == 0));
        assert_eq!(projection.cells[1].x, 7);
    }

    #[test]
    fn test_single_sensor_fully_degenerate() {
        let sensors = layout(&[[0.4, -0.2, 1.3]]);
        let projection = GridProjector::new(6).unwrap().project(&sensors);

        assert_eq!(projection.flat_axes, [true, true, true]);
        assert_eq!(projection.cells[0], GridCell::new(0, 0, 0));
    }

    #[test]
    fn test_zero_resolution_rejected() {
        assert!(matches!(
            GridProjector::new(0),
            Err(HologramError::InvalidResolution)
        ));
    }
}
