//! Voxel accumulation - the synthesis kernel
//!
//! Every (sensor, frequency) pair adds a sinusoidal wavefront centred on the
//! sensor's cell, amplitude-modulated per time-step by that pair's
//! normalized magnitude:
//!
//! ```text
//! volume[t, v] += sin(distance[s, v] * scale[f]) * magnitude[s, f, t]
//! ```
//!
//! Pairs are applied one at a time so only a single R³ wave is live at
//! once. Within a pair, frames are updated in parallel; each frame sees the
//! pairs in the same order regardless of thread count, so results are
//! reproducible bit for bit.

use ndarray::{Array3, Zip};
use rayon::prelude::*;

use crate::distance::DistanceField;
use crate::error::{HologramError, HologramResult};
use crate::spectral::NormalizedSpectrum;
use crate::volume::VoxelVolume;

/// Accumulates wavefronts from validated inputs.
#[derive(Debug)]
pub struct VoxelAccumulator<'a> {
    distances: &'a DistanceField,
    spectrum: &'a NormalizedSpectrum,
    scales: Vec<f32>,
}

impl<'a> VoxelAccumulator<'a> {
    /// Check every shape up front; nothing is accumulated on mismatch.
    pub fn new(
        resolution: usize,
        distances: &'a DistanceField,
        spectrum: &'a NormalizedSpectrum,
        scales: Vec<f32>,
    ) -> HologramResult<Self> {
        if distances.resolution() != resolution {
            return Err(HologramError::shape(
                "distance volume resolution",
                resolution,
                distances.resolution(),
            ));
        }
        if spectrum.sensors() != distances.sensor_count() {
            return Err(HologramError::shape(
                "spectral sensor axis",
                distances.sensor_count(),
                spectrum.sensors(),
            ));
        }
        if spectrum.frequencies() != scales.len() {
            return Err(HologramError::shape(
                "spectral frequency axis",
                scales.len(),
                spectrum.frequencies(),
            ));
        }

        Ok(Self {
            distances,
            spectrum,
            scales,
        })
    }

    pub fn resolution(&self) -> usize {
        self.distances.resolution()
    }

    pub fn steps(&self) -> usize {
        self.spectrum.steps()
    }

    pub fn pair_count(&self) -> usize {
        self.spectrum.sensors() * self.spectrum.frequencies()
    }

    /// Sensor-major, frequency-minor pair order.
    pub fn sensor_major(&self) -> impl Iterator<Item = (usize, usize)> {
        let frequencies = self.spectrum.frequencies();
        (0..self.spectrum.sensors())
            .flat_map(move |sensor| (0..frequencies).map(move |frequency| (sensor, frequency)))
    }

    /// Accumulate every pair in sensor-major order.
    pub fn accumulate(&self) -> VoxelVolume {
        let mut volume = self.empty_volume();
        for (sensor, frequency) in self.sensor_major() {
            self.add_pair(&mut volume, sensor, frequency);
        }
        volume
    }

    /// Accumulate pairs in the given order. Indices are checked before any
    /// work; `on_pair` runs after each pair with the number completed.
    pub fn accumulate_pairs<I, F>(&self, pairs: I, mut on_pair: F) -> HologramResult<VoxelVolume>
    where
        I: IntoIterator<Item = (usize, usize)>,
        F: FnMut(usize, usize, usize),
    {
        let pairs: Vec<(usize, usize)> = pairs.into_iter().collect();
        for &(sensor, frequency) in &pairs {
            if sensor >= self.spectrum.sensors() {
                return Err(HologramError::shape(
                    "pair sensor index",
                    self.spectrum.sensors(),
                    sensor,
                ));
            }
            if frequency >= self.spectrum.frequencies() {
                return Err(HologramError::shape(
                    "pair frequency index",
                    self.spectrum.frequencies(),
                    frequency,
                ));
            }
        }

        let mut volume = self.empty_volume();
        for (done, &(sensor, frequency)) in pairs.iter().enumerate() {
            self.add_pair(&mut volume, sensor, frequency);
            on_pair(sensor, frequency, done + 1);
        }
        Ok(volume)
    }

    /// `sin(distance * scale)` for one pair: the only R³ intermediate.
    pub fn wavefront(&self, sensor: usize, frequency: usize) -> Array3<f32> {
        let distance = self.distances.volume(sensor);
        let scale = self.scales[frequency];
        let mut wave = Array3::zeros(distance.raw_dim());
        Zip::from(&mut wave)
            .and(&distance)
            .par_for_each(|w, &d| *w = (d * scale).sin());
        wave
    }

    /// Add one pair's contribution to every frame.
    pub fn add_pair(&self, volume: &mut VoxelVolume, sensor: usize, frequency: usize) {
        let wave = self.wavefront(sensor, frequency);
        let series = self.spectrum.series(sensor, frequency);

        volume
            .frames_mut()
            .into_par_iter()
            .enumerate()
            .for_each(|(step, mut frame)| frame.scaled_add(series[step], &wave));

        log::trace!("[ACCUMULATE] sensor {} frequency {}", sensor, frequency);
    }

    fn empty_volume(&self) -> VoxelVolume {
        VoxelVolume::zeros(self.steps(), self.resolution())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projector::GridCell;
    use crate::spectral::{SpectralNormalizer, SpectralTensor};
    use approx::assert_abs_diff_eq;

    fn normalized(sensors: usize, freqs: usize, steps: usize, data: Vec<f32>) -> NormalizedSpectrum {
        let tensor = SpectralTensor::from_vec(sensors, freqs, steps, data).unwrap();
        SpectralNormalizer::new(1e-6, None).normalize(&tensor).0
    }

    #[test]
    fn test_single_pair_matches_formula() {
        let distances = DistanceField::build(3, &[GridCell::new(0, 1, 2)]).unwrap();
        let spectrum = normalized(1, 1, 2, vec![1.0, 0.0]);
        let acc = VoxelAccumulator::new(3, &distances, &spectrum, vec![1.5]).unwrap();
        let volume = acc.accumulate();

        let magnitude = spectrum.series(0, 0)[0];
        for ((x, y, z), &v) in volume.frame(0).indexed_iter() {
            let expected = (distances.volume(0)[[x, y, z]] * 1.5).sin() * magnitude;
            assert_abs_diff_eq!(v, expected, epsilon = 1e-6);
        }
        assert!(volume.frame(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_order_independent() {
        let cells = [GridCell::new(0, 0, 0), GridCell::new(3, 1, 2), GridCell::new(2, 2, 2)];
        let distances = DistanceField::build(4, &cells).unwrap();
        let data: Vec<f32> = (0..3 * 2 * 5).map(|i| ((i * 7) % 13) as f32 * 0.3).collect();
        let spectrum = normalized(3, 2, 5, data);
        let acc = VoxelAccumulator::new(4, &distances, &spectrum, vec![0.5, 2.0]).unwrap();

        let forward = acc.accumulate();
        let mut reversed: Vec<(usize, usize)> = acc.sensor_major().collect();
        reversed.reverse();
        let backward = acc.accumulate_pairs(reversed, |_, _, _| {}).unwrap();

        for (a, b) in forward.view().iter().zip(backward.view().iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_progress_callback_counts() {
        let distances = DistanceField::build(2, &[GridCell::new(0, 0, 0); 2]).unwrap();
        let spectrum = normalized(2, 3, 1, vec![1.0; 6]);
        let acc = VoxelAccumulator::new(2, &distances, &spectrum, vec![0.5, 1.0, 2.0]).unwrap();

        let mut seen = Vec::new();
        acc.accumulate_pairs(acc.sensor_major(), |s, f, done| seen.push((s, f, done)))
            .unwrap();

        assert_eq!(acc.pair_count(), 6);
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], (0, 0, 1));
        assert_eq!(seen[3], (1, 0, 4));
        assert_eq!(seen[5], (1, 2, 6));
    }

    #[test]
    fn test_shape_mismatches_fail_fast() {
        let distances = DistanceField::build(3, &[GridCell::new(0, 0, 0)]).unwrap();
        let spectrum = normalized(1, 2, 2, vec![1.0; 4]);

        let wrong_resolution = VoxelAccumulator::new(4, &distances, &spectrum, vec![0.5, 2.0]);
        assert!(matches!(wrong_resolution, Err(HologramError::ShapeMismatch { .. })));

        let wrong_freqs = VoxelAccumulator::new(3, &distances, &spectrum, vec![0.5]);
        assert!(matches!(wrong_freqs, Err(HologramError::ShapeMismatch { .. })));

        let two_sensors = normalized(2, 2, 2, vec![1.0; 8]);
        let wrong_sensors = VoxelAccumulator::new(3, &distances, &two_sensors, vec![0.5, 2.0]);
        assert!(matches!(wrong_sensors, Err(HologramError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_bad_pair_index_rejected() {
        let distances = DistanceField::build(2, &[GridCell::new(0, 0, 0)]).unwrap();
        let spectrum = normalized(1, 1, 1, vec![1.0]);
        let acc = VoxelAccumulator::new(2, &distances, &spectrum, vec![1.0]).unwrap();

        let result = acc.accumulate_pairs([(0, 0), (0, 1)], |_, _, _| {});
        assert!(matches!(result, Err(HologramError::ShapeMismatch { .. })));
    }
}
