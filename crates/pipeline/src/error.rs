//! Result and Error types for ptools-pipeline

use std::path::PathBuf;

/// Type alias for `Result<T, pipeline::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for `ptools-pipeline`
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Underlying file I/O error
    #[error("failure in file I/O")]
    Io(#[from] std::io::Error),

    /// Failure to (de)serialise a configuration file
    #[error("failed serde JSON operation")]
    Json(#[from] serde_json::Error),

    /// Errors from reading, accumulating, or writing fluence
    #[error(transparent)]
    Fluence(#[from] ptools_fluence::Error),

    /// Errors from synthesizing or writing the spectrum
    #[error(transparent)]
    Spectrum(#[from] ptools_spectrum::Error),

    /// Worker pool could not be created
    #[error("unable to build worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Configuration file that could not be loaded
    #[error("unable to load configuration {path:?}: {reason}")]
    UnreadableConfig { path: PathBuf, reason: String },

    /// Range of the observation window that is empty or out of bounds
    #[error("invalid {field} range {start}-{end} in observation window")]
    InvalidWindow {
        field: &'static str,
        start: u16,
        end: u16,
    },

    /// Worker pool with no workers
    #[error("number of workers must be at least 1")]
    NoWorkers,

    /// Year directory that exists but could not be listed
    #[error("unable to list measurement files in {path:?}")]
    Discovery {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Nothing to accumulate in the observation window
    #[error("no measurement files found in {data_dir:?} for the observation window {window}")]
    NoFilesInWindow { data_dir: PathBuf, window: String },

    /// Every discovered file was skipped, so there is no flux to work with
    #[error("none of the {0} measurement files in the observation window could be read")]
    NothingAccumulated(usize),

    /// Accumulation failure tied to the file that caused it
    #[error("failed to accumulate {path:?}")]
    Accumulation {
        path: PathBuf,
        source: ptools_fluence::Error,
    },

    /// Accumulator lock poisoned by a panicking worker
    #[error("accumulator lock poisoned by a failed worker")]
    PoisonedAccumulator,
}
