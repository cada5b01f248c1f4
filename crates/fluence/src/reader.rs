//! Reader for daily proton flux measurement files
//!
//! Each measurement file is a JSON document holding, for every telescope, a
//! `<T>_DifferentialProtonFluxes` array and optionally the `energy_<T>_label`
//! channel labels.
//!
//! The flux array is `[time][direction][energy_bin]`, or `[time][energy_bin]`
//! for omnidirectional data which is treated as a single direction. Entries
//! may be `null`.
//!
//! ```json
//! {
//!     "T1_DifferentialProtonFluxes": [
//!         [[1.0, 2.0], [3.0, null]],
//!         [[1.0, 2.0], [3.0, 4.0]]
//!     ],
//!     "energy_T1_label": ["T1P1: 1.0-1.9 MeV", "T1P2A: 1.9-2.3 MeV"]
//! }
//! ```

// standard library
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

// crate modules
use crate::band::EnergyBandTable;
use crate::error::{Error, Result};
use crate::parsers;

// ptools modules
use ptools_format::f;

// external crates
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

/// Tolerance on label bounds before warning about a table mismatch (MeV)
const LABEL_TOLERANCE: f64 = 1.0e-3;

/// One file's contribution for one telescope
///
/// The flux values are already summed over every time step in the file, and
/// are indexed as `values[direction][energy_bin]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFluxSample {
    /// Telescope identifier, e.g. "T1"
    pub telescope: String,
    /// Time-summed flux, `[direction][energy_bin]`
    pub values: Vec<Vec<f64>>,
    /// Number of time steps summed into `values`
    pub time_steps: usize,
}

impl RawFluxSample {
    /// Shape of the flux array as `(directions, energy_bins)`
    pub fn shape(&self) -> (usize, usize) {
        shape_of(&self.values)
    }
}

/// Outcome of looking for one telescope in a measurement file
#[derive(Debug, Clone, PartialEq)]
pub enum TelescopeRead {
    /// Flux data found for the telescope
    Present(RawFluxSample),
    /// No data for the telescope in this file, which is expected and silent
    Absent(String),
}

/// Everything extracted from a single measurement file
#[derive(Debug, Clone, PartialEq)]
pub struct FileFluxes {
    /// Path of the file that was read
    pub path: PathBuf,
    /// One entry per configured telescope, in table order
    pub telescopes: Vec<TelescopeRead>,
}

impl FileFluxes {
    /// Only the telescopes that were present in the file
    pub fn samples(&self) -> impl Iterator<Item = &RawFluxSample> {
        self.telescopes.iter().filter_map(|t| match t {
            TelescopeRead::Present(sample) => Some(sample),
            TelescopeRead::Absent(_) => None,
        })
    }

    /// Consume into the telescopes that were present in the file
    pub fn into_samples(self) -> impl Iterator<Item = RawFluxSample> {
        self.telescopes.into_iter().filter_map(|t| match t {
            TelescopeRead::Present(sample) => Some(sample),
            TelescopeRead::Absent(_) => None,
        })
    }
}

/// Raw flux arrays as found in the file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FluxArray {
    /// `[time][direction][energy_bin]`
    Directional(Vec<Vec<Vec<Option<f64>>>>),
    /// `[time][energy_bin]`
    Omnidirectional(Vec<Vec<Option<f64>>>),
}

/// Reads measurement files for every telescope in an [EnergyBandTable]
///
/// Missing or invalid flux entries (`null`, non-finite, or negative fill
/// values) are replaced by `0.0` before summing over time.
///
/// - A telescope missing from the file is [TelescopeRead::Absent]
/// - A file that cannot be opened or parsed is an [Error::UnreadableFile]
///
/// ```rust, no_run
/// # use ptools_fluence::{EnergyBandTable, FluxFileReader};
/// let table = EnergyBandTable::default();
/// let reader = FluxFileReader::new(&table);
///
/// let fluxes = reader.read("path/to/ops_seis-l1b-sgps_g16_d20200101.json").unwrap();
/// for sample in fluxes.samples() {
///     println!("{} {:?}", sample.telescope, sample.shape());
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FluxFileReader<'a> {
    table: &'a EnergyBandTable,
}

impl<'a> FluxFileReader<'a> {
    /// Reader for the telescopes configured in `table`
    pub fn new(table: &'a EnergyBandTable) -> Self {
        Self { table }
    }

    /// Extract the time-summed flux of every configured telescope
    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<FileFluxes> {
        let path = path.as_ref();
        let mut document = Self::load(path).map_err(|e| unreadable(path, e))?;

        let mut telescopes = Vec::new();
        for telescope in self.table.telescopes() {
            let Some(value) = document.remove(&flux_key(telescope)) else {
                debug!("{}: no data for {telescope}", display_name(path));
                telescopes.push(TelescopeRead::Absent(telescope.to_string()));
                continue;
            };

            let sample = Self::time_summed(telescope, value).map_err(|e| unreadable(path, e))?;
            let Some(sample) = sample else {
                warn!("{}: empty flux array for {telescope}", display_name(path));
                telescopes.push(TelescopeRead::Absent(telescope.to_string()));
                continue;
            };

            if let Some(labels) = document.remove(&label_key(telescope)) {
                self.check_labels(path, telescope, labels);
            }

            telescopes.push(TelescopeRead::Present(sample));
        }

        Ok(FileFluxes {
            path: path.to_path_buf(),
            telescopes,
        })
    }

    fn load(path: &Path) -> Result<HashMap<String, Value>> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Clean and sum the flux array over the time axis
    ///
    /// Returns `None` for a file with no time steps, directions, or energy
    /// bins, since such an array holds no flux and must not fix the shape of
    /// a telescope.
    fn time_summed(telescope: &str, value: Value) -> Result<Option<RawFluxSample>> {
        let steps: Vec<Vec<Vec<Option<f64>>>> = match serde_json::from_value(value)? {
            FluxArray::Directional(steps) => steps,
            FluxArray::Omnidirectional(steps) => steps.into_iter().map(|s| vec![s]).collect(),
        };

        let Some(first) = steps.first() else {
            return Ok(None);
        };

        let shape = (first.len(), first.first().map_or(0, |d| d.len()));
        let mut values = vec![vec![0.0; shape.1]; shape.0];

        for step in &steps {
            if step.len() != shape.0 || step.iter().any(|d| d.len() != shape.1) {
                return Err(Error::RaggedArray(telescope.to_string()));
            }

            for (total, direction) in values.iter_mut().zip(step) {
                for (t, v) in total.iter_mut().zip(direction) {
                    *t += clean(*v);
                }
            }
        }

        if shape.0 == 0 || shape.1 == 0 {
            return Ok(None);
        }

        Ok(Some(RawFluxSample {
            telescope: telescope.to_string(),
            values,
            time_steps: steps.len(),
        }))
    }

    /// Warn if the labels in the file disagree with the configured bands
    fn check_labels(&self, path: &Path, telescope: &str, labels: Value) {
        let name = display_name(path);
        let Ok(labels) = serde_json::from_value::<Vec<String>>(labels) else {
            warn!("{name}: energy labels for {telescope} are not a list of strings");
            return;
        };

        let Some(bands) = self.table.bands(telescope) else {
            return;
        };

        if labels.len() != bands.len() {
            warn!(
                "{name}: {} energy labels for {telescope}, but {} bands are configured",
                labels.len(),
                bands.len()
            );
        }

        for (label, band) in labels.iter().zip(bands) {
            match parsers::channel_label(label) {
                Ok((low, high)) => {
                    if (low - band.low()).abs() > LABEL_TOLERANCE
                        || (high - band.high()).abs() > LABEL_TOLERANCE
                    {
                        warn!("{name}: label \"{label}\" disagrees with configured band {band} MeV");
                    }
                }
                Err(_) => warn!("{name}: unable to parse energy label \"{label}\""),
            }
        }
    }
}

/// Key of the flux array for a telescope
pub fn flux_key(telescope: &str) -> String {
    f!("{telescope}_DifferentialProtonFluxes")
}

/// Key of the energy labels for a telescope
pub fn label_key(telescope: &str) -> String {
    f!("energy_{telescope}_label")
}

/// `(rows, columns)` taken from the first row
pub(crate) fn shape_of(values: &[Vec<f64>]) -> (usize, usize) {
    (values.len(), values.first().map_or(0, |row| row.len()))
}

/// Missing, undefined, and negative fill values all count as zero flux
fn clean(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

fn unreadable(path: &Path, error: Error) -> Error {
    let reason = match &error {
        Error::Io(e) => f!("{e}"),
        Error::Json(e) => f!("{e}"),
        e => f!("{e}"),
    };
    Error::UnreadableFile {
        path: path.to_path_buf(),
        reason,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
