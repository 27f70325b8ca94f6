//! Synthesis pipeline - projection, distance field, normalization, accumulation
//!
//! Stages run strictly in sequence on the calling thread; each consumes the
//! complete output of the one before. Configuration and shape problems are
//! rejected before any stage runs, so a failed call never yields a partial
//! volume.

use std::sync::Arc;

use crate::accumulator::VoxelAccumulator;
use crate::config::HologramConfig;
use crate::distance::DistanceField;
use crate::error::{HologramError, HologramResult};
use crate::observer::{Stage, SynthesisEvent, SynthesisObserver};
use crate::projector::GridProjector;
use crate::sensor::SensorLayout;
use crate::spectral::{FrequencyAxis, SpectralNormalizer, SpectralTensor};
use crate::volume::HologramOutput;

/// Drives one synthesis run per call.
pub struct HologramPipeline {
    config: HologramConfig,
    observers: Vec<Arc<dyn SynthesisObserver>>,
}

impl HologramPipeline {
    /// Create a pipeline. Invalid configuration is rejected here.
    pub fn new(config: HologramConfig) -> HologramResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            observers: Vec::new(),
        })
    }

    pub fn config(&self) -> &HologramConfig {
        &self.config
    }

    /// Subscribe an observer to synthesis events.
    pub fn subscribe(&mut self, observer: Arc<dyn SynthesisObserver>) {
        self.observers.push(observer);
    }

    fn emit(&self, event: SynthesisEvent) {
        for observer in &self.observers {
            observer.on_event(event.clone());
        }
    }

    /// Synthesize the voxel hologram for one recording.
    pub fn synthesize(
        &self,
        layout: &SensorLayout,
        frequencies: &FrequencyAxis,
        spectrum: &SpectralTensor,
    ) -> HologramResult<HologramOutput> {
        if spectrum.sensors() != layout.len() {
            return Err(HologramError::shape(
                "spectral sensor axis",
                layout.len(),
                spectrum.sensors(),
            ));
        }
        if spectrum.frequencies() != frequencies.len() {
            return Err(HologramError::shape(
                "spectral frequency axis",
                frequencies.len(),
                spectrum.frequencies(),
            ));
        }

        let config = &self.config;
        log::info!(
            "[HOLOGRAM] {} sensors x {} frequencies x {} steps at resolution {}",
            layout.len(),
            frequencies.len(),
            config.kept_steps(spectrum.steps()),
            config.resolution
        );

        let projection = GridProjector::new(config.resolution)?.project(layout);
        for axis in (0..3usize).filter(|&axis| projection.flat_axes[axis]) {
            self.emit(SynthesisEvent::DegenerateAxis { axis });
        }
        self.emit(SynthesisEvent::StageComplete {
            stage: Stage::Projection,
        });

        let distances = DistanceField::build(config.resolution, &projection.cells)?;
        self.emit(SynthesisEvent::StageComplete {
            stage: Stage::DistanceField,
        });

        let (normalized, report) =
            SpectralNormalizer::new(config.epsilon, config.max_steps).normalize(spectrum);
        for &(sensor, frequency) in &report.degenerate {
            self.emit(SynthesisEvent::DegenerateSlice { sensor, frequency });
        }
        self.emit(SynthesisEvent::StageComplete {
            stage: Stage::Normalization,
        });

        let scales = frequencies.scales(config.scale_low, config.scale_high);
        let accumulator = VoxelAccumulator::new(config.resolution, &distances, &normalized, scales)?;
        let total = accumulator.pair_count();
        let volume = accumulator.accumulate_pairs(accumulator.sensor_major(), |sensor, frequency, completed| {
            self.emit(SynthesisEvent::PairAccumulated {
                sensor,
                frequency,
                completed,
                total,
            });
        })?;
        self.emit(SynthesisEvent::StageComplete {
            stage: Stage::Accumulation,
        });

        log::info!(
            "[HOLOGRAM] accumulated {} pairs into {} frames (max |v| = {:.4})",
            total,
            volume.time_steps(),
            volume.max_abs()
        );

        Ok(HologramOutput {
            volume,
            cells: projection.cells,
            flat_axes: projection.flat_axes,
            report,
        })
    }
}
