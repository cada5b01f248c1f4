//! Pipeline configuration
//!
//! Everything tunable about a run lives in [PipelineConfig]. Configuration
//! files are JSON, and every field has a default so a file only needs the
//! values that differ.
//!
//! ```json
//! {
//!     "data_dir": "/data/goes16/sgps",
//!     "window": { "years": [2020, 2025], "months": [1, 12], "days": [1, 31] },
//!     "gamma": 3.0,
//!     "sub_bins_per_band": 20
//! }
//! ```

// standard library
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

// crate modules
use crate::error::{Error, Result};
use crate::window::ObservationWindow;

// ptools modules
use ptools_fluence::{BandFluenceCalculator, EnergyBandTable};
use ptools_spectrum::{log_edges, SpectrumSynthesizer};

// external crates
use serde::{Deserialize, Serialize};

/// Conversion from summed differential flux to fluence
///
/// Flux is reported per second, per steradian, and per keV for each time
/// step. The product of the integration interval, the solid angle, and the
/// keV to MeV factor gives the scaling applied before multiplying by the band
/// width in MeV.
///
/// ```rust
/// # use ptools_pipeline::InstrumentGeometry;
/// let geometry = InstrumentGeometry::default();
/// assert!((geometry.scaling_factor() - 552_000.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentGeometry {
    /// Length of one measurement time step (s)
    pub integration_seconds: f64,
    /// Telescope acceptance solid angle (sr)
    pub solid_angle: f64,
    /// Flux width units per MeV, 1000 for flux given per keV
    pub width_units_per_mev: f64,
}

impl Default for InstrumentGeometry {
    fn default() -> Self {
        Self {
            integration_seconds: 300.0,
            solid_angle: 1.84,
            width_units_per_mev: 1000.0,
        }
    }
}

impl InstrumentGeometry {
    /// Single multiplicative factor for every telescope
    pub fn scaling_factor(&self) -> f64 {
        self.integration_seconds * self.solid_angle * self.width_units_per_mev
    }
}

/// Complete set of tunables for a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Root directory holding one sub-directory of measurement files per year
    pub data_dir: PathBuf,
    /// Years, months, and days to accumulate over
    pub window: ObservationWindow,
    /// Energy bands of every telescope
    pub band_table: EnergyBandTable,
    /// Summed flux to fluence conversion, see [InstrumentGeometry]
    pub scaling_factor: f64,
    /// Power-law index used within each band
    pub gamma: f64,
    /// Log-spaced sub-bins per energy band
    pub sub_bins_per_band: usize,
    /// Size of the file ingestion worker pool
    pub workers: usize,
    /// Band fluence table path, named after the window if not set
    pub fluence_output: Option<PathBuf>,
    /// Spectrum file path
    pub spectrum_output: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            window: ObservationWindow::default(),
            band_table: EnergyBandTable::default(),
            scaling_factor: InstrumentGeometry::default().scaling_factor(),
            gamma: 2.5,
            sub_bins_per_band: 10,
            workers: std::thread::available_parallelism().map_or(1, |n| n.get()),
            fluence_output: None,
            spectrum_output: PathBuf::from("input_spectrum.txt"),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file
    ///
    /// Missing fields take their default values. The result is not validated
    /// so that command line overrides can be applied first.
    ///
    /// ```rust, no_run
    /// # use ptools_pipeline::PipelineConfig;
    /// let config = PipelineConfig::from_file("sgps.json").unwrap();
    /// config.validate().unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::UnreadableConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::UnreadableConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write the configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Reject degenerate configuration before any file is touched
    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;

        if self.workers == 0 {
            return Err(Error::NoWorkers);
        }

        BandFluenceCalculator::new(&self.band_table, self.scaling_factor)?;
        SpectrumSynthesizer::new(self.gamma, self.sub_bins_per_band)?;

        // log spacing needs a strictly positive lower bound
        for (_, band) in self.band_table.iter() {
            log_edges(&band, 1)?;
        }
        Ok(())
    }

    /// Path of the band fluence table
    pub fn fluence_output(&self) -> PathBuf {
        self.fluence_output
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.window.fluence_file_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.band_table.len(), 13);
        assert_eq!(
            config.fluence_output(),
            PathBuf::from("cumulative_fluence_2020-2025_1-12_1-31.txt")
        );
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"gamma": 3.0, "window": {"years": [2021, 2021]}}"#).unwrap();
        assert_eq!(config.gamma, 3.0);
        assert_eq!(config.window.years, (2021, 2021));
        assert_eq!(config.window.months, (1, 12));
        assert_eq!(config.sub_bins_per_band, 10);
    }

    #[test]
    fn unknown_fields_are_refused() {
        let result = serde_json::from_str::<PipelineConfig>(r#"{"gama": 3.0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn degenerate_band_tables_are_refused() {
        let result = serde_json::from_str::<PipelineConfig>(r#"{"band_table": {"T1": [[2.0, 1.0]]}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn degenerate_numbers_are_refused() {
        let mut config = PipelineConfig {
            scaling_factor: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Fluence(_))));

        config.scaling_factor = 1.0;
        config.sub_bins_per_band = 0;
        assert!(matches!(config.validate(), Err(Error::Spectrum(_))));

        config.sub_bins_per_band = 1;
        config.gamma = f64::INFINITY;
        assert!(matches!(config.validate(), Err(Error::Spectrum(_))));

        config.gamma = 2.5;
        config.workers = 0;
        assert!(matches!(config.validate(), Err(Error::NoWorkers)));

        config.workers = 1;
        config.band_table = EnergyBandTable::from_bounds([("T1", vec![(0.0, 1.0)])]).unwrap();
        assert!(matches!(config.validate(), Err(Error::Spectrum(_))));
    }
}
