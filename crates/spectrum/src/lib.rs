//! Power-law energy spectrum synthesis from banded fluence
//!
#![doc = include_str!("../readme.md")]

mod error;
mod subbin;
mod synthesizer;
mod writer;

#[doc(inline)]
pub use subbin::{Spectrum, SubBin};

#[doc(inline)]
pub use synthesizer::{log_edges, synthesize, SpectrumSynthesizer};

#[doc(inline)]
pub use writer::{read_spectrum, read_spectrum_file, write_spectrum, write_spectrum_file};

#[doc(inline)]
pub use error::{Error, Result};
