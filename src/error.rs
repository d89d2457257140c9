use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a [`FixtureError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller asked for something that cannot be synthesized or written.
    InvalidInput,
    /// The filesystem or the WAV container got in the way.
    IoFailure,
}

/// Custom error types for fixture generation
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Invalid duration: {0} seconds")]
    InvalidDuration(f64),

    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("Invalid synthesis parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Invalid fixture filename: {0:?}")]
    InvalidFilename(String),

    #[error("Fixture list is empty")]
    EmptyFixtureList,

    #[error("Failed to parse fixture manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Output directory does not exist: {}", .0.display())]
    OutputDirMissing(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),

    #[error("WAV header mismatch in {}: {detail}", .path.display())]
    HeaderMismatch { path: PathBuf, detail: String },
}

impl FixtureError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FixtureError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns whether this error stems from bad input or from the environment.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FixtureError::InvalidDuration(_)
            | FixtureError::InvalidSampleRate(_)
            | FixtureError::InvalidParameter { .. }
            | FixtureError::InvalidFilename(_)
            | FixtureError::EmptyFixtureList
            | FixtureError::Manifest(_) => ErrorKind::InvalidInput,
            FixtureError::OutputDirMissing(_)
            | FixtureError::Io { .. }
            | FixtureError::Wav(_)
            | FixtureError::HeaderMismatch { .. } => ErrorKind::IoFailure,
        }
    }
}

/// Type alias for fixture generation results
pub type FixtureResult<T> = Result<T, FixtureError>;
