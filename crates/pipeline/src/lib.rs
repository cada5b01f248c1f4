//! Batch pipeline from daily proton flux files to a Monte Carlo source spectrum
//!
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod config;
mod driver;
mod error;
mod parsers;
mod window;

// Inline anything important for a nice public API
#[doc(inline)]
pub use config::{InstrumentGeometry, PipelineConfig};

#[doc(inline)]
pub use window::{discover_files, ObservationWindow};

#[doc(inline)]
pub use driver::{IngestStats, PipelineDriver, PipelineReport, TelescopeCoverage};

#[doc(inline)]
pub use error::{Error, Result};
