//! Command-line entry point: parse arguments, load a model file, render it
//! iteration by iteration, and flush PPM frames at the cadence in §6.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use minilight::cli::Cli;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(minilight::MlError::Interrupted) => {
            info!("interrupted; last frame left on disk");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), minilight::MlError> {
    let text = std::fs::read_to_string(&cli.model)?;
    let model = minilight::modelfile::parse(&text)?;

    let output_path = {
        let mut p = cli.model.clone().into_os_string();
        p.push(".ppm");
        std::path::PathBuf::from(p)
    };

    if !cli.quiet {
        eprintln!();
        eprintln!("  minilight-rs");
        eprintln!("  model:      {}", cli.model.display());
        eprintln!("  resolution: {}x{}", model.width, model.height);
        eprintln!("  triangles:  {}", model.scene.triangle_count());
        eprintln!("  emitters:   {}", model.scene.emitter_count());
        eprintln!();
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))
            .map_err(|_| minilight::MlError::Interrupted)?;
    }

    let quiet = cli.quiet;
    let total = cli.iterations.unwrap_or(model.iterations);
    let completed = minilight::render(
        model,
        cli.iterations,
        cli.seed,
        || interrupted.load(Ordering::SeqCst),
        |iteration, image| {
            minilight::flush_to_path(image, iteration, &output_path)?;
            if !quiet {
                eprintln!("  wrote iteration {iteration}/{total} -> {}", output_path.display());
            }
            Ok(())
        },
    );

    match completed {
        Ok(n) => {
            if !quiet {
                eprintln!();
                eprintln!("  done: {n} iterations, output at {}", output_path.display());
            }
            Ok(())
        }
        Err(minilight::MlError::Interrupted) => Err(minilight::MlError::Interrupted),
        Err(other) => Err(other),
    }
}
