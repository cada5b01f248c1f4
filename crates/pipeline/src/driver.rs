// standard library
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// crate modules
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::window::discover_files;

// ptools modules
use ptools_fluence::{
    write_fluence_table, BandFluenceCalculator, BandFluenceTable, FluenceAccumulator,
    FluxFileReader, TelescopeTotals,
};
use ptools_format::NumFormat;
use ptools_spectrum::{write_spectrum_file, Spectrum, SpectrumSynthesizer};

// external crates
use kdam::par_tqdm;
use log::{debug, info, warn};
use rayon::prelude::*;

/// What happened to a single measurement file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    /// Read and absorbed, with the number of telescopes present
    Absorbed(usize),
    /// Could not be read, so skipped
    Skipped,
}

/// Files and time steps absorbed for one telescope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelescopeCoverage {
    /// Number of files with data for the telescope
    pub files: usize,
    /// Number of time steps summed over those files
    pub time_steps: usize,
}

impl From<&TelescopeTotals> for TelescopeCoverage {
    fn from(totals: &TelescopeTotals) -> Self {
        Self {
            files: totals.files,
            time_steps: totals.time_steps,
        }
    }
}

/// Bookkeeping for the ingestion stage of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestStats {
    /// Files found in the observation window
    pub discovered: usize,
    /// Files read and absorbed
    pub read: usize,
    /// Files skipped as unreadable
    pub skipped: usize,
    /// Files read that had no data for any configured telescope
    pub empty: usize,
    /// Coverage of each telescope with any data
    pub coverage: BTreeMap<String, TelescopeCoverage>,
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Ingestion bookkeeping
    pub stats: IngestStats,
    /// Cumulative fluence per band
    pub fluence: BandFluenceTable,
    /// Sum of fluence over every band (particles/cm²)
    pub total_fluence: f64,
    /// Number of sub-bins in the spectrum
    pub sub_bins: usize,
    /// Where the band fluence table was written
    pub fluence_output: PathBuf,
    /// Where the spectrum was written
    pub spectrum_output: PathBuf,
}

/// Batch pipeline from measurement files to a source spectrum
///
/// A run goes through the following stages:
///
/// 1. Discover files in the observation window
/// 2. Read files on a bounded worker pool, absorbing each into a shared
///    accumulator one at a time
/// 3. Convert the per-telescope totals into fluence per energy band
/// 4. Synthesize the normalised spectrum from the band fluence
///
/// Unreadable files are skipped with a warning. A flux array that disagrees
/// with the shape already established for its telescope stops the run, naming
/// both the file and the telescope.
///
/// The shape of a telescope is set by whichever file is absorbed first. With a
/// single worker that is the first file in the sorted listing, so the file
/// reported for a mismatch is reproducible. With more workers it is the first
/// offender found, which may differ between runs.
///
/// ```rust, no_run
/// # use ptools_pipeline::{PipelineConfig, PipelineDriver};
/// let config = PipelineConfig::from_file("sgps.json").unwrap();
/// let report = PipelineDriver::new(config).unwrap().run().unwrap();
///
/// println!("Total fluence: {:.4e}", report.total_fluence);
/// ```
#[derive(Debug)]
pub struct PipelineDriver {
    config: PipelineConfig,
    disable_progress: bool,
}

impl PipelineDriver {
    /// Driver for a validated configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            disable_progress: false,
        })
    }

    /// Do not print the tqdm progress indicators
    pub fn disable_progress(&mut self) {
        self.disable_progress = true;
    }

    /// Configuration used by the driver
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage and write both artifacts
    pub fn run(&self) -> Result<PipelineReport> {
        let (fluence, stats) = self.accumulate()?;

        let fluence_output = self.config.fluence_output();
        write_fluence_table(&fluence, &fluence_output)?;
        info!("Band fluence written to {}", fluence_output.display());

        let spectrum = self.synthesize(&fluence)?;
        let spectrum_output = self.config.spectrum_output.clone();
        write_spectrum_file(&spectrum, &spectrum_output)?;
        info!("Spectrum written to {}", spectrum_output.display());

        Ok(PipelineReport {
            stats,
            total_fluence: fluence.total(),
            fluence,
            sub_bins: spectrum.len(),
            fluence_output,
            spectrum_output,
        })
    }

    /// Fluence per band over the observation window
    pub fn accumulate(&self) -> Result<(BandFluenceTable, IngestStats)> {
        let files = discover_files(&self.config.data_dir, &self.config.window)?;
        info!(
            "Found {} measurement files for {}",
            files.len(),
            self.config.window
        );

        let (accumulator, stats) = self.ingest(&files)?;
        if accumulator.is_empty() {
            return Err(Error::NothingAccumulated(stats.discovered));
        }

        let calculator = BandFluenceCalculator::new(&self.config.band_table, self.config.scaling_factor)?;
        let fluence = calculator.compute(accumulator.totals())?;
        info!("Total fluence: {} particles/cm²", fluence.total().sci(4, 2));
        Ok((fluence, stats))
    }

    /// Normalised spectrum from fluence per band
    pub fn synthesize(&self, fluence: &BandFluenceTable) -> Result<Spectrum> {
        let synthesizer = SpectrumSynthesizer::new(self.config.gamma, self.config.sub_bins_per_band)?;
        let spectrum = synthesizer.synthesize(fluence, &self.config.band_table)?;
        debug!(
            "Spectrum integral over {} sub-bins: {}",
            spectrum.len(),
            spectrum.integral()
        );
        Ok(spectrum)
    }

    /// Read and absorb every file on the worker pool
    pub fn ingest(&self, files: &[PathBuf]) -> Result<(FluenceAccumulator, IngestStats)> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()?;

        let reader = FluxFileReader::new(&self.config.band_table);
        let accumulator = Mutex::new(FluenceAccumulator::new());

        let outcomes: Vec<FileOutcome> = pool.install(|| {
            par_tqdm!(
                files
                    .par_iter()
                    .map(|path| Self::ingest_file(&reader, &accumulator, path)),
                disable = self.disable_progress,
                bar_format = "Reading files: {count}/{total} [{rate:.2} files/s]  "
            )
            .collect::<Result<Vec<FileOutcome>>>()
        })?;

        if !self.disable_progress {
            eprintln!();
        }

        let accumulator = accumulator
            .into_inner()
            .map_err(|_| Error::PoisonedAccumulator)?;

        let skipped = outcomes.iter().filter(|o| **o == FileOutcome::Skipped).count();
        let empty = outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Absorbed(n) if *n == 0))
            .count();
        let stats = IngestStats {
            discovered: files.len(),
            read: files.len() - skipped,
            skipped,
            empty,
            coverage: accumulator
                .totals()
                .iter()
                .map(|(t, totals)| (t.clone(), TelescopeCoverage::from(totals)))
                .collect(),
        };

        Self::log_stats(&stats);
        Ok((accumulator, stats))
    }

    /// Read one file and absorb it, holding the lock only while absorbing
    fn ingest_file(
        reader: &FluxFileReader,
        accumulator: &Mutex<FluenceAccumulator>,
        path: &Path,
    ) -> Result<FileOutcome> {
        let fluxes = match reader.read(path) {
            Ok(fluxes) => fluxes,
            Err(e) => {
                warn!("Skipping {}: {e}", path.display());
                return Ok(FileOutcome::Skipped);
            }
        };

        let mut accumulator = accumulator
            .lock()
            .map_err(|_| Error::PoisonedAccumulator)?;

        let mut present = 0;
        for sample in fluxes.samples() {
            accumulator
                .absorb_sample(sample)
                .map_err(|source| Error::Accumulation {
                    path: path.to_path_buf(),
                    source,
                })?;
            present += 1;
        }

        debug!("Absorbed {present} telescopes from {}", path.display());
        Ok(FileOutcome::Absorbed(present))
    }

    fn log_stats(stats: &IngestStats) {
        info!(
            "Read {} of {} files ({} skipped)",
            stats.read, stats.discovered, stats.skipped
        );
        if stats.empty > 0 {
            warn!("{} files had no data for any configured telescope", stats.empty);
        }
        for (telescope, coverage) in &stats.coverage {
            info!(
                "  {telescope}: {} files, {} time steps",
                coverage.files, coverage.time_steps
            );
        }
    }
}
