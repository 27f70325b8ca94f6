//! Voxel Hologram - sensor spectra to time-indexed 3D scalar fields
//!
//! Every sensor becomes a wave source. Every frequency sets the wavelength.
//!
//! # Core Types
//!
//! - **SensorLayout**: Ordered 3D sensor positions (index = sensor id)
//! - **SpectralTensor**: Magnitudes indexed `[sensor, frequency, time]`
//! - **VoxelVolume**: The output, indexed `[time, x, y, z]`
//!
//! # Pipeline
//!
//! 1. **Projection** - positions normalized against their bounding box and
//!    truncated onto an R×R×R lattice ([`GridProjector`])
//! 2. **Distance field** - per-sensor Euclidean distance to every voxel
//!    ([`DistanceField`])
//! 3. **Normalization** - each (sensor, frequency) series rescaled to unit
//!    energy across time ([`SpectralNormalizer`])
//! 4. **Accumulation** - each (sensor, frequency) pair adds
//!    `sin(distance * scale) * magnitude[t]` to every frame
//!    ([`VoxelAccumulator`])
//!
//! Stages run in order on one thread; inside a stage the work is
//! data-parallel over voxels and frames. Only one R³ intermediate exists at
//! a time during accumulation.
//!
//! # Example
//!
//! ```rust
//! use voxel_hologram::{
//!     FrequencyAxis, HologramConfig, HologramPipeline, SensorLayout, SpectralTensor,
//! };
//!
//! let layout = SensorLayout::from_positions([
//!     [-0.07, 0.00, 0.02],
//!     [0.07, 0.00, 0.02],
//!     [0.00, 0.08, 0.05],
//! ])?;
//! let freqs = FrequencyAxis::linspace(4.0, 30.0, 4);
//!
//! // 3 sensors x 4 frequencies x 10 steps
//! let magnitudes: Vec<f32> = (0..120).map(|i| (i % 7) as f32).collect();
//! let spectrum = SpectralTensor::from_vec(3, 4, 10, magnitudes)?;
//!
//! let config = HologramConfig::new(8).with_max_steps(-1);
//! let output = HologramPipeline::new(config)?.synthesize(&layout, &freqs, &spectrum)?;
//!
//! assert_eq!(output.volume.time_steps(), 10);
//! assert_eq!(output.volume.resolution(), 8);
//! assert_eq!(output.cells.len(), 3);
//! # Ok::<(), voxel_hologram::HologramError>(())
//! ```

mod accumulator;
mod config;
mod distance;
mod error;
pub mod npy;
mod observer;
mod pipeline;
mod projector;
mod sensor;
mod spectral;
mod volume;

pub use accumulator::VoxelAccumulator;
pub use config::{
    HologramConfig, DEFAULT_EPSILON, DEFAULT_RESOLUTION, DEFAULT_SCALE_HIGH, DEFAULT_SCALE_LOW,
};
pub use distance::{DistanceField, Lattice};
pub use error::{HologramError, HologramResult};
pub use observer::{ChannelObserver, FnObserver, Stage, SynthesisEvent, SynthesisObserver};
pub use pipeline::HologramPipeline;
pub use projector::{GridCell, GridProjector, Projection};
pub use sensor::{BoundingBox, Sensor, SensorLayout};
pub use spectral::{
    FrequencyAxis, NormalizationReport, NormalizedSpectrum, SpectralNormalizer, SpectralTensor,
};
pub use volume::{HologramOutput, VoxelVolume, CELLS_FILE, VOXELS_FILE};
