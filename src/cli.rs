//! Command-line argument parsing (§6 "CLI", §10.1).

use std::path::PathBuf;

use clap::Parser;

/// Renders a MiniLight-style model file to a tone-mapped PPM image via
/// Monte Carlo path tracing.
#[derive(Debug, Parser)]
#[command(name = "minilight", version, about, disable_help_flag = true)]
pub struct Cli {
    /// Path to the model file to render. Output is written alongside it
    /// with a `.ppm` extension appended.
    pub model: PathBuf,

    /// Overrides the model file's iteration count.
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Overrides the default PRNG seed.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Suppresses the startup banner and per-flush progress messages.
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Prints usage information and exits.
    #[arg(short = '?', long = "help", action = clap::ArgAction::Help)]
    help: Option<bool>,
}
