//! A physically-based global-illumination path tracer: loads a text model
//! file describing a triangle-mesh scene and a camera, then renders it to a
//! tone-mapped PPM image via unidirectional Monte Carlo path tracing with
//! next-event estimation.

pub mod camera;
pub mod cli;
pub mod error;
pub mod image;
pub mod modelfile;
pub mod octree;
pub mod random;
pub mod raytracer;
pub mod scene;
pub mod surface_point;
pub mod triangle;
pub mod vector;

use std::io::Write;

use tracing::info;

pub use error::MlError;
pub use modelfile::ModelData;

/// The default PRNG seed (§4.2); overridable via [`cli::Cli::seed`].
pub const DEFAULT_SEED: u32 = 987_654_321;

/// Renders `model` for `model.iterations` iterations (or the override in
/// `iterations_override`), invoking `on_flush` after every iteration whose
/// frame is written out — i.e. power-of-two iterations and the last one
/// (§6 "flush cadence"). `should_stop` is polled between iterations so a
/// caller (the CLI's ctrlc handler) can request a clean early stop that
/// still leaves the most recent PPM on disk (§7 "Interrupt").
///
/// This is the single entry point shared by `main.rs` and the integration
/// tests in `tests/`.
pub fn render(
    model: ModelData,
    iterations_override: Option<u32>,
    seed: Option<u32>,
    mut should_stop: impl FnMut() -> bool,
    mut on_flush: impl FnMut(u32, &image::Image) -> Result<(), MlError>,
) -> Result<u32, MlError> {
    if iterations_override == Some(0) {
        return Err(MlError::InvalidModel {
            line: 0,
            reason: "--iterations override must be positive".to_string(),
        });
    }

    let ModelData {
        iterations,
        width,
        height,
        camera,
        scene,
    } = model;
    let total = iterations_override.unwrap_or(iterations);

    let mut image = image::Image::new(width, height);
    let mut random = random::Random::from_seed(seed.unwrap_or(DEFAULT_SEED));

    let mut completed = 0u32;
    for i in 1..=total {
        camera.get_frame(&scene, &mut random, &mut image);
        completed = i;

        let is_power_of_two = i & (i - 1) == 0;
        let is_last = i == total;
        let interrupted = should_stop();

        if is_power_of_two || is_last || interrupted {
            info!(iteration = i, total, "flushing frame");
            on_flush(i, &image)?;
        }
        if interrupted {
            return Err(MlError::Interrupted);
        }
    }

    Ok(completed)
}

/// Writes `image`'s current state to `path`, overwriting it wholesale
/// (§6 "Output file").
pub fn flush_to_path(image: &image::Image, iteration: u32, path: &std::path::Path) -> Result<(), MlError> {
    let mut file = std::fs::File::create(path)?;
    image.write_ppm(&mut file, iteration)?;
    file.flush()?;
    Ok(())
}
