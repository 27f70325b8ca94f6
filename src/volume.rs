//! Voxel volume - the time-indexed stack of 3D frames
//!
//! Allocated zero-filled, mutated only by the accumulator, then handed out
//! read-only as part of [`HologramOutput`].

use std::borrow::Cow;
use std::path::Path;

use ndarray::iter::AxisIterMut;
use ndarray::{Array4, ArrayView3, ArrayView4, Axis, Ix3};

use crate::error::HologramResult;
use crate::npy;
use crate::projector::GridCell;
use crate::spectral::NormalizationReport;

/// File name of the persisted volume.
pub const VOXELS_FILE: &str = "voxels.npy";

/// File name of the persisted sensor cells.
pub const CELLS_FILE: &str = "ch_pos.npy";

/// 4D volume, `[time, x, y, z]`.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelVolume {
    data: Array4<f32>,
}

impl VoxelVolume {
    /// Zero-filled volume.
    pub fn zeros(steps: usize, resolution: usize) -> Self {
        Self {
            data: Array4::zeros((steps, resolution, resolution, resolution)),
        }
    }

    pub(crate) fn from_array(data: Array4<f32>) -> Self {
        Self { data }
    }

    #[cfg(test)]
    pub(crate) fn frame_mut(&mut self, step: usize) -> ndarray::ArrayViewMut3<'_, f32> {
        self.data.index_axis_mut(Axis(0), step)
    }

    pub(crate) fn frames_mut(&mut self) -> AxisIterMut<'_, f32, Ix3> {
        self.data.axis_iter_mut(Axis(0))
    }

    // =========================================================================
    // READING
    // =========================================================================

    pub fn time_steps(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn resolution(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// One 3D frame.
    pub fn frame(&self, step: usize) -> ArrayView3<'_, f32> {
        self.data.index_axis(Axis(0), step)
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    pub fn into_array(self) -> Array4<f32> {
        self.data
    }

    /// Flat C-order samples.
    pub fn as_slice(&self) -> Option<&[f32]> {
        self.data.as_slice()
    }

    // =========================================================================
    // METRICS
    // =========================================================================

    /// Global `(min, max)`, or `None` for an empty volume.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.data.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Largest absolute sample.
    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0f32, |m, v| m.max(v.abs()))
    }

    /// Sum of squares in one frame.
    pub fn frame_energy(&self, step: usize) -> f32 {
        self.frame(step).iter().map(|v| v * v).sum()
    }

    pub fn non_zero_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0.0).count()
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&v| v == 0.0)
    }

    /// Min-max rescale to [0, 1] for display. A constant volume maps to zeros.
    pub fn normalized(&self) -> VoxelVolume {
        let Some((lo, hi)) = self.min_max() else {
            return self.clone();
        };
        let span = hi - lo;
        if span == 0.0 || !span.is_finite() {
            return Self::from_array(Array4::zeros(self.data.raw_dim()));
        }
        Self::from_array(self.data.mapv(|v| (v - lo) / span))
    }
}

/// Everything the synthesis core hands to persistence or rendering.
#[derive(Clone, Debug)]
pub struct HologramOutput {
    pub volume: VoxelVolume,
    /// One cell per sensor, in sensor order.
    pub cells: Vec<GridCell>,
    /// Axes that collapsed during projection.
    pub flat_axes: [bool; 3],
    pub report: NormalizationReport,
}

impl HologramOutput {
    /// Cells as `(S, 3)` signed integers, the layout renderers expect.
    pub fn cell_rows(&self) -> Vec<i32> {
        self.cells
            .iter()
            .flat_map(|c| c.as_array().map(|v| v as i32))
            .collect()
    }

    /// Write `voxels.npy` and `ch_pos.npy` into `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> HologramResult<()> {
        let dir = dir.as_ref();
        let shape = self.volume.data.shape();
        let samples: Cow<'_, [f32]> = match self.volume.as_slice() {
            Some(flat) => Cow::Borrowed(flat),
            None => Cow::Owned(self.volume.data.iter().copied().collect()),
        };

        npy::write_f32(dir.join(VOXELS_FILE), shape, &samples)?;
        npy::write_i32(dir.join(CELLS_FILE), &[self.cells.len(), 3], &self.cell_rows())?;

        log::info!(
            "[SAVE] wrote {} frames at resolution {} to {}",
            self.volume.time_steps(),
            self.volume.resolution(),
            dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_volume_is_zero() {
        let volume = VoxelVolume::zeros(3, 4);
        assert_eq!(volume.time_steps(), 3);
        assert_eq!(volume.resolution(), 4);
        assert!(volume.is_zero());
        assert_eq!(volume.non_zero_count(), 0);
        assert_eq!(volume.max_abs(), 0.0);
    }

    #[test]
    fn test_frame_writes_and_metrics() {
        let mut volume = VoxelVolume::zeros(2, 2);
        volume.frame_mut(1)[[0, 1, 1]] = -3.0;
        volume.frame_mut(1)[[1, 0, 0]] = 4.0;

        assert_eq!(volume.non_zero_count(), 2);
        assert_eq!(volume.max_abs(), 4.0);
        assert_eq!(volume.min_max(), Some((-3.0, 4.0)));
        assert_eq!(volume.frame_energy(0), 0.0);
        assert_relative_eq!(volume.frame_energy(1), 25.0);
    }

    #[test]
    fn test_normalized_unit_range() {
        let mut volume = VoxelVolume::zeros(1, 2);
        volume.frame_mut(0)[[0, 0, 0]] = -1.0;
        volume.frame_mut(0)[[1, 1, 1]] = 3.0;
        let normalized = volume.normalized();

        assert_eq!(normalized.min_max(), Some((0.0, 1.0)));
        assert_relative_eq!(normalized.frame(0)[[0, 1, 0]], 0.25);
    }

    #[test]
    fn test_constant_volume_normalizes_to_zero() {
        let volume = VoxelVolume::from_array(Array4::from_elem((2, 2, 2, 2), 7.0));
        assert!(volume.normalized().is_zero());
    }

    #[test]
    fn test_accumulated_volume_is_contiguous() {
        let volume = VoxelVolume::zeros(3, 4);
        assert_eq!(volume.as_slice().map(<[f32]>::len), Some(3 * 64));
    }

    #[test]
    fn test_save_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut volume = VoxelVolume::zeros(2, 3);
        volume.frame_mut(1)[[2, 1, 0]] = 0.5;
        let output = HologramOutput {
            volume,
            cells: vec![GridCell::new(0, 1, 2), GridCell::new(2, 2, 2)],
            flat_axes: [false; 3],
            report: NormalizationReport::default(),
        };

        output.save(dir.path()).unwrap();

        let (shape, samples) = npy::read_f32(dir.path().join(VOXELS_FILE)).unwrap();
        assert_eq!(shape, vec![2, 3, 3, 3]);
        assert_eq!(samples.len(), 54);
        assert_eq!(samples[27 + 2 * 9 + 3], 0.5);

        let (shape, cells) = npy::read_i32(dir.path().join(CELLS_FILE)).unwrap();
        assert_eq!(shape, vec![2, 3]);
        assert_eq!(cells, vec![0, 1, 2, 2, 2, 2]);
    }
}
