//! Fluence accumulation from per-telescope proton flux measurements
//!
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod accumulator;
mod band;
mod calculator;
mod error;
mod parsers;
mod reader;
mod table;

// Inline anything important for a nice public API
#[doc(inline)]
pub use band::{EnergyBand, EnergyBandTable};

#[doc(inline)]
pub use reader::{flux_key, label_key, FileFluxes, FluxFileReader, RawFluxSample, TelescopeRead};

#[doc(inline)]
pub use accumulator::{FluenceAccumulator, TelescopeTotals};

#[doc(inline)]
pub use calculator::{compute_fluence, BandFluenceCalculator};

#[doc(inline)]
pub use table::{
    read_fluence, read_fluence_table, write_fluence, write_fluence_table, BandFluenceTable,
    FLUENCE_HEADER,
};

#[doc(inline)]
pub use error::{Error, Result};
