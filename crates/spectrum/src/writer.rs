//! Read and write operations for spectrum files
//!
//! A spectrum file has no header, just one `<energy>\t<density>` row per
//! sub-bin in ascending energy. Numbers are always plain decimals since the
//! source sampling tools do not accept exponents.
//!
//! ```text
//! 1.031594	0.946532179424741
//! 1.096437	0.788406112396254
//! ```

// standard library
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

// crate modules
use crate::error::Result;
use crate::subbin::Spectrum;

// ptools modules
use ptools_format::NumFormat;

/// Fractional digits written before trailing zeros are trimmed
const SPECTRUM_PRECISION: usize = 15;

/// Write a [Spectrum] to a tab-delimited text file
///
/// ```rust, no_run
/// # use ptools_fluence::{BandFluenceTable, EnergyBandTable};
/// # use ptools_spectrum::{synthesize, write_spectrum_file};
/// # let fluence = BandFluenceTable::new();
/// let spectrum = synthesize(&fluence, &EnergyBandTable::default(), 2.5, 10).unwrap();
/// write_spectrum_file(&spectrum, "input_spectrum.txt").unwrap();
/// ```
pub fn write_spectrum_file<P: AsRef<Path>>(spectrum: &Spectrum, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_spectrum(spectrum, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write spectrum rows to any writer
pub fn write_spectrum<W: Write>(spectrum: &Spectrum, writer: &mut W) -> Result<()> {
    for bin in spectrum.sub_bins() {
        writeln!(
            writer,
            "{}\t{}",
            bin.energy.plain(SPECTRUM_PRECISION),
            bin.density.plain(SPECTRUM_PRECISION)
        )?;
    }
    Ok(())
}

/// Read `(energy, density)` rows back from a spectrum file
pub fn read_spectrum_file<P: AsRef<Path>>(path: P) -> Result<Vec<(f64, f64)>> {
    read_spectrum(BufReader::new(File::open(path)?))
}

/// Read `(energy, density)` rows from any reader
pub fn read_spectrum<R: Read>(reader: R) -> Result<Vec<(f64, f64)>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.deserialize::<(f64, f64)>() {
        rows.push(record?);
    }
    Ok(rows)
}
