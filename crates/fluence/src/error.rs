//! Result and Error types for ptools-fluence

use std::path::PathBuf;

/// Type alias for `Result<T, fluence::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for `ptools-fluence`
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Underlying file I/O error
    #[error("failure in file I/O")]
    Io(#[from] std::io::Error),

    /// Failure to (de)serialise JSON
    #[error("failed serde JSON operation")]
    Json(#[from] serde_json::Error),

    /// Failure reading a tab-delimited table
    #[error("failed CSV operation")]
    Csv(#[from] csv::Error),

    /// A measurement file that could not be opened or parsed at all
    #[error("unable to read {path:?}: {reason}")]
    UnreadableFile { path: PathBuf, reason: String },

    /// Energy band where the lower bound is not below the upper bound
    #[error("degenerate energy band {low}-{high} MeV (low must be below high)")]
    DegenerateBand { low: f64, high: f64 },

    /// Two configured energy bands share some part of their range
    #[error("energy bands {first} and {second} MeV overlap")]
    OverlappingBands { first: String, second: String },

    /// A telescope configured with no bands at all
    #[error("telescope \"{0}\" has no energy bands")]
    EmptyTelescope(String),

    /// Flux array shape disagrees with the shape established by earlier files
    #[error(
        "inconsistent flux array for telescope \"{telescope}\" (expected {expected:?}, found {found:?} as [direction, bin])"
    )]
    ShapeMismatch {
        telescope: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Rows of a flux array with differing numbers of energy bins
    #[error("ragged flux array for telescope \"{0}\"")]
    RaggedArray(String),

    /// Fewer accumulated energy bins than configured bands
    #[error("telescope \"{telescope}\" has {found} energy bins but {expected} bands are configured")]
    BandCountMismatch {
        telescope: String,
        expected: usize,
        found: usize,
    },

    /// Scaling factor that is zero, negative, or not a number
    #[error("scaling factor must be positive and finite, found {0}")]
    InvalidScalingFactor(f64),

    /// Fluence value that is negative or not a number
    #[error("invalid fluence {value} for band {band}")]
    InvalidFluence { band: String, value: f64 },

    /// Band label that is not of the form `<low>-<high>`
    #[error("failed to parse energy band from \"{0}\"")]
    InvalidBandLabel(String),
}
