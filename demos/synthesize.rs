//! Standalone synthesis demo: a synthetic scalp montage to voxels.npy
//!
//! Builds 32 sensors on the upper half of a sphere (roughly where a 10-20
//! montage sits), fakes a band-limited spectrum where each sensor's alpha
//! power waxes and wanes with its own phase, then synthesizes the hologram
//! and writes `voxels.npy` + `ch_pos.npy` to the output directory.
//!
//! Run: cargo run --release --example synthesize [out_dir]
//! Set RUST_LOG=debug for per-stage detail.

use std::sync::Arc;

use voxel_hologram::{
    FnObserver, FrequencyAxis, HologramConfig, HologramPipeline, HologramResult, SensorLayout,
    SpectralTensor, SynthesisEvent,
};

const SENSORS: usize = 32;
const FMIN: f32 = 4.0;
const FMAX: f32 = 30.0;
const NFREQ: usize = 26;
const STEPS: usize = 120;
const RESOLUTION: usize = 24;

fn montage() -> Vec<[f32; 3]> {
    let golden = std::f32::consts::PI * (3.0 - 5.0f32.sqrt());
    (0..SENSORS)
        .map(|i| {
            // Fibonacci spiral over the upper hemisphere, head radius ~9 cm
            let z = 1.0 - (i as f32 + 0.5) / SENSORS as f32;
            let r = (1.0 - z * z).sqrt();
            let theta = golden * i as f32;
            [0.09 * r * theta.cos(), 0.09 * r * theta.sin(), 0.09 * z]
        })
        .collect()
}

fn spectrum(freqs: &FrequencyAxis) -> HologramResult<SpectralTensor> {
    let mut data = Vec::with_capacity(SENSORS * freqs.len() * STEPS);
    for sensor in 0..SENSORS {
        let phase = sensor as f32 * 0.4;
        for &freq in freqs.bins() {
            // 1/f background plus an alpha bump around 10 Hz
            let alpha = (-((freq - 10.0) / 2.0).powi(2)).exp();
            for step in 0..STEPS {
                let t = step as f32 / STEPS as f32;
                let envelope = 0.5 + 0.5 * (std::f32::consts::TAU * 2.0 * t + phase).sin();
                data.push(1.0 / freq + alpha * envelope);
            }
        }
    }
    SpectralTensor::from_vec(SENSORS, freqs.len(), STEPS, data)
}

fn main() -> HologramResult<()> {
    env_logger::init();

    let out_dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());

    println!("=== Voxel Hologram Demo ===\n");

    let layout = SensorLayout::from_positions(montage())?;
    let freqs = FrequencyAxis::linspace(FMIN, FMAX, NFREQ);
    let spectrum = spectrum(&freqs)?;

    let config = HologramConfig::new(RESOLUTION).with_max_steps(-1);
    let mut pipeline = HologramPipeline::new(config)?;
    pipeline.subscribe(Arc::new(FnObserver(|event| match event {
        SynthesisEvent::PairAccumulated {
            completed, total, ..
        } if completed % 128 == 0 || completed == total => {
            println!("  accumulated {:>4}/{} pairs", completed, total);
        }
        SynthesisEvent::StageComplete { stage } => println!("  stage done: {:?}", stage),
        _ => {}
    })));

    let output = pipeline.synthesize(&layout, &freqs, &spectrum)?;

    let (lo, hi) = output.volume.min_max().unwrap_or((0.0, 0.0));
    println!(
        "\nVolume: {} frames x {}^3 voxels, range [{:.3}, {:.3}]",
        output.volume.time_steps(),
        output.volume.resolution(),
        lo,
        hi
    );

    output.save(&out_dir)?;
    println!("Saved {} and {} to {}", voxel_hologram::VOXELS_FILE, voxel_hologram::CELLS_FILE, out_dir);

    Ok(())
}
