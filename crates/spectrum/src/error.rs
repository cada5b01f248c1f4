//! Result and Error types for ptools-spectrum

/// Type alias for `Result<T, spectrum::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for `ptools-spectrum`
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Underlying file I/O error
    #[error("failure in file I/O")]
    Io(#[from] std::io::Error),

    /// Failure reading a tab-delimited spectrum
    #[error("failed CSV operation")]
    Csv(#[from] csv::Error),

    /// Errors from the fluence crate
    #[error(transparent)]
    Fluence(#[from] ptools_fluence::Error),

    /// Sub-bin count that can not divide a band
    #[error("sub-bins per band must be at least 1, found {0}")]
    InvalidSubBinCount(usize),

    /// Power-law index that is not a finite number
    #[error("power-law index must be finite, found {0}")]
    InvalidGamma(f64),

    /// Band starting at zero energy can not be log-spaced
    #[error("band {0} MeV starts at zero and can not be log-spaced")]
    ZeroLowerBound(String),

    /// Fluence value that is negative or not a number
    #[error("invalid fluence {value} for band {band} MeV")]
    InvalidFluence { band: String, value: f64 },

    /// Power-law weights of a band that can not be normalised
    #[error("power-law weights for band {band} MeV with index {gamma} can not be normalised")]
    DegenerateWeights { band: String, gamma: f64 },

    /// Total share overflowed, so densities would not be numbers
    #[error("total fluence over all bands is not finite ({0})")]
    NonFiniteTotal(f64),

    /// Every band has zero fluence, so there is nothing to normalise
    #[error("total fluence over all bands is zero, the spectrum can not be normalised")]
    NoFluence,
}
