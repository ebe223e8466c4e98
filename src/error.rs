//! The renderer's single error type. Every fallible boundary (model-file
//! parsing, PPM I/O, interruption) funnels into this enum rather than
//! panicking (§7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MlError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid model file at line {line}: {reason}")]
    InvalidModel { line: usize, reason: String },

    #[error("interrupted")]
    Interrupted,
}
