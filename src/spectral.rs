//! Spectral input and per-slice energy normalization
//!
//! The magnitude tensor is indexed `[sensor, frequency, time]`. Each
//! (sensor, frequency) slice is rescaled to unit L2 norm across time:
//!
//! ```text
//! normalized[s, f, t] = raw[s, f, t] / (sqrt(sum_t raw[s, f, t]²) + ε)
//! ```
//!
//! The time axis is truncated to the configured step cap *before* norms are
//! computed, so the rendered subset is itself unit-energy.

use ndarray::{s, Array2, Array3, ArrayView1, ArrayView3, Axis, Zip};

use crate::error::{HologramError, HologramResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ordered frequency-bin values aligned with the tensor's frequency axis.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrequencyAxis {
    bins: Vec<f32>,
}

impl FrequencyAxis {
    pub fn new(bins: Vec<f32>) -> Self {
        Self { bins }
    }

    /// `count` bins evenly spaced over `[low, high]`.
    pub fn linspace(low: f32, high: f32, count: usize) -> Self {
        Self::new(linspace(low, high, count))
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn bins(&self) -> &[f32] {
        &self.bins
    }

    /// Wavefront scale per bin: lowest bin maps to `low`, highest to `high`.
    pub fn scales(&self, low: f32, high: f32) -> Vec<f32> {
        linspace(low, high, self.bins.len())
    }
}

fn linspace(low: f32, high: f32, count: usize) -> Vec<f32> {
    match count {
        0 => Vec::new(),
        1 => vec![low],
        n => {
            let step = (high - low) / (n - 1) as f32;
            (0..n).map(|i| low + step * i as f32).collect()
        }
    }
}

/// Raw non-negative magnitudes, `[sensor, frequency, time]`. Read-only.
#[derive(Clone, Debug)]
pub struct SpectralTensor {
    data: Array3<f32>,
}

impl SpectralTensor {
    pub fn from_array(data: Array3<f32>) -> Self {
        Self { data }
    }

    /// Build from a flat C-order buffer.
    pub fn from_vec(
        sensors: usize,
        frequencies: usize,
        steps: usize,
        data: Vec<f32>,
    ) -> HologramResult<Self> {
        let expected = sensors * frequencies * steps;
        let actual = data.len();
        let data = Array3::from_shape_vec((sensors, frequencies, steps), data)
            .map_err(|_| HologramError::shape("spectral buffer length", expected, actual))?;
        Ok(Self { data })
    }

    pub fn sensors(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn frequencies(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn steps(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }
}

/// What normalization had to paper over.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizationReport {
    /// Slices with non-finite input (or no time axis), zeroed out: `(sensor, frequency)`.
    pub degenerate: Vec<(usize, usize)>,
    /// Slices with zero energy (left at zero).
    pub silent: usize,
}

impl NormalizationReport {
    pub fn is_clean(&self) -> bool {
        self.degenerate.is_empty()
    }
}

/// Unit-energy magnitudes, `[sensor, frequency, time]`.
#[derive(Clone, Debug)]
pub struct NormalizedSpectrum {
    data: Array3<f32>,
}

impl NormalizedSpectrum {
    pub fn sensors(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn frequencies(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn steps(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Time series for one (sensor, frequency) pair.
    pub fn series(&self, sensor: usize, frequency: usize) -> ArrayView1<'_, f32> {
        self.data.slice(s![sensor, frequency, ..])
    }

    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// L2 norm of one slice across time.
    pub fn norm(&self, sensor: usize, frequency: usize) -> f32 {
        l2_norm(self.series(sensor, frequency)) as f32
    }
}

/// Accumulated in f64 so large finite magnitudes cannot overflow to inf.
fn l2_norm(lane: ArrayView1<'_, f32>) -> f64 {
    lane.iter()
        .map(|&v| f64::from(v) * f64::from(v))
        .sum::<f64>()
        .sqrt()
}

/// Truncates the time axis and normalizes each slice to unit energy.
#[derive(Clone, Copy, Debug)]
pub struct SpectralNormalizer {
    epsilon: f32,
    max_steps: Option<usize>,
}

impl SpectralNormalizer {
    pub fn new(epsilon: f32, max_steps: Option<usize>) -> Self {
        Self { epsilon, max_steps }
    }

    pub fn normalize(&self, tensor: &SpectralTensor) -> (NormalizedSpectrum, NormalizationReport) {
        let steps = self.max_steps.map_or(tensor.steps(), |cap| cap.min(tensor.steps()));
        let mut data = tensor.data.slice(s![.., .., ..steps]).to_owned();

        let norms: Array2<f64> = data.map_axis(Axis(2), l2_norm);

        let mut report = NormalizationReport::default();
        for ((sensor, frequency), &norm) in norms.indexed_iter() {
            if steps == 0 || !norm.is_finite() {
                report.degenerate.push((sensor, frequency));
            } else if norm == 0.0 {
                report.silent += 1;
            }
        }

        let epsilon = f64::from(self.epsilon);
        Zip::from(data.lanes_mut(Axis(2)))
            .and(&norms)
            .par_for_each(|mut lane, &norm| {
                if norm.is_finite() {
                    let scale = 1.0 / (norm + epsilon);
                    lane.mapv_inplace(|v| (f64::from(v) * scale) as f32);
                } else {
                    lane.fill(0.0);
                }
            });

        if !report.degenerate.is_empty() {
            log::warn!(
                "[NORMALIZE] {} slices had non-finite input and were zeroed",
                report.degenerate.len()
            );
        }
        log::debug!(
            "[NORMALIZE] {} slices over {} steps ({} silent)",
            norms.len(),
            steps,
            report.silent
        );

        (NormalizedSpectrum { data }, report)
    }
}
