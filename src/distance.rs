//! Distance fields - per-sensor Euclidean distance over the voxel lattice
//!
//! The integer coordinate lattice is materialized once and shared by every
//! sensor; each sensor then costs one parallel R³ pass.

use ndarray::{Array3, Array4, ArrayView3, ArrayViewMut3, Axis, Zip};

use crate::error::{HologramError, HologramResult};
use crate::projector::GridCell;

/// Coordinate lattice of shape R×R×R, indexed `[x, y, z]`.
#[derive(Clone, Debug)]
pub struct Lattice {
    xs: Array3<f32>,
    ys: Array3<f32>,
    zs: Array3<f32>,
}

impl Lattice {
    pub fn new(resolution: usize) -> Self {
        let shape = (resolution, resolution, resolution);
        Self {
            xs: Array3::from_shape_fn(shape, |(x, _, _)| x as f32),
            ys: Array3::from_shape_fn(shape, |(_, y, _)| y as f32),
            zs: Array3::from_shape_fn(shape, |(_, _, z)| z as f32),
        }
    }

    pub fn resolution(&self) -> usize {
        self.xs.len_of(Axis(0))
    }

    /// Distance from every lattice point to `cell`.
    pub fn distances_to(&self, cell: GridCell) -> Array3<f32> {
        let mut out = Array3::zeros(self.xs.raw_dim());
        self.fill_distances(cell, out.view_mut());
        out
    }

    fn fill_distances(&self, cell: GridCell, out: ArrayViewMut3<'_, f32>) {
        let [cx, cy, cz] = cell.as_array().map(|c| c as f32);
        Zip::from(out)
            .and(&self.xs)
            .and(&self.ys)
            .and(&self.zs)
            .par_for_each(|d, &x, &y, &z| {
                let (dx, dy, dz) = (x - cx, y - cy, z - cz);
                *d = (dx * dx + dy * dy + dz * dz).sqrt();
            });
    }
}

/// One distance volume per sensor, stacked as `[sensor, x, y, z]`.
#[derive(Clone, Debug)]
pub struct DistanceField {
    volumes: Array4<f32>,
}

impl DistanceField {
    /// Build distance volumes for every cell, in cell order.
    pub fn build(resolution: usize, cells: &[GridCell]) -> HologramResult<Self> {
        if resolution == 0 {
            return Err(HologramError::InvalidResolution);
        }
        let lattice = Lattice::new(resolution);
        Ok(Self::from_lattice(&lattice, cells))
    }

    /// Build against an existing lattice.
    pub fn from_lattice(lattice: &Lattice, cells: &[GridCell]) -> Self {
        let r = lattice.resolution();
        let mut volumes = Array4::zeros((cells.len(), r, r, r));
        for (cell, volume) in cells.iter().zip(volumes.outer_iter_mut()) {
            lattice.fill_distances(*cell, volume);
        }

        log::debug!(
            "[DISTANCE] built {} volumes at resolution {}",
            cells.len(),
            r
        );

        Self { volumes }
    }

    pub fn sensor_count(&self) -> usize {
        self.volumes.len_of(Axis(0))
    }

    pub fn resolution(&self) -> usize {
        self.volumes.len_of(Axis(1))
    }

    /// Distance volume for one sensor.
    pub fn volume(&self, sensor: usize) -> ArrayView3<'_, f32> {
        self.volumes.index_axis(Axis(0), sensor)
    }
}
