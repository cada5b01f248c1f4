//! `ptools` is a small toolkit for turning space weather proton flux
//! measurements into Monte Carlo source spectra
//!
#![doc = include_str!("../readme.md")]
#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Re-exports of toolkit crates.
#[doc(inline)]
pub use ptools_format as format;

#[cfg(feature = "fluence")]
#[cfg_attr(docsrs, doc(cfg(feature = "fluence")))]
#[doc(inline)]
pub use ptools_fluence as fluence;

#[cfg(feature = "spectrum")]
#[cfg_attr(docsrs, doc(cfg(feature = "spectrum")))]
#[doc(inline)]
pub use ptools_spectrum as spectrum;

#[cfg(feature = "pipeline")]
#[cfg_attr(docsrs, doc(cfg(feature = "pipeline")))]
#[doc(inline)]
pub use ptools_pipeline as pipeline;
