//! Band fluence table and its tab-delimited text format
//!
//! The table is written with a single header row, then one row per band in
//! ascending energy order.
//!
//! ```text
//! Energy Band (MeV)	Total Fluence (particles/cm²)
//! 1.0-1.9	125432.5000
//! 1.9-2.3	40211.1250
//! ```

// standard library
use std::collections::btree_map::{self, BTreeMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

// crate modules
use crate::band::EnergyBand;
use crate::error::{Error, Result};

/// Header row of a band fluence table
pub const FLUENCE_HEADER: &str = "Energy Band (MeV)\tTotal Fluence (particles/cm²)";

/// Fixed-point precision of fluence values written to file
const FLUENCE_PRECISION: usize = 4;

/// Cumulative fluence for each physical energy band (particles/cm²)
///
/// Keyed by [EnergyBand], so iteration is always in ascending energy order.
/// Values inserted for a band that already exists are added to it.
///
/// ```rust
/// # use ptools_fluence::{BandFluenceTable, EnergyBand};
/// let band = EnergyBand::new(1.0, 1.9).unwrap();
///
/// let mut table = BandFluenceTable::new();
/// table.add(band, 400.0);
/// table.add(band, 600.0);
///
/// assert_eq!(table.get(&band), Some(1000.0));
/// assert_eq!(table.total(), 1000.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandFluenceTable {
    fluence: BTreeMap<EnergyBand, f64>,
}

impl BandFluenceTable {
    /// Empty table
    pub fn new() -> Self {
        Default::default()
    }

    /// Add fluence to a band, creating the entry if needed
    pub fn add(&mut self, band: EnergyBand, fluence: f64) {
        *self.fluence.entry(band).or_insert(0.0) += fluence;
    }

    /// Fluence for a band, if there is an entry for it
    pub fn get(&self, band: &EnergyBand) -> Option<f64> {
        self.fluence.get(band).copied()
    }

    /// Sum of fluence over every band
    pub fn total(&self) -> f64 {
        self.fluence.values().sum()
    }

    /// Iterate over `(band, fluence)` in ascending energy order
    pub fn iter(&self) -> impl Iterator<Item = (&EnergyBand, &f64)> {
        self.fluence.iter()
    }

    /// Number of bands in the table
    pub fn len(&self) -> usize {
        self.fluence.len()
    }

    /// True if there are no bands
    pub fn is_empty(&self) -> bool {
        self.fluence.is_empty()
    }
}

impl FromIterator<(EnergyBand, f64)> for BandFluenceTable {
    fn from_iter<I: IntoIterator<Item = (EnergyBand, f64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (band, fluence) in iter {
            table.add(band, fluence);
        }
        table
    }
}

impl IntoIterator for BandFluenceTable {
    type Item = (EnergyBand, f64);
    type IntoIter = btree_map::IntoIter<EnergyBand, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.fluence.into_iter()
    }
}

/// Write a [BandFluenceTable] to a tab-delimited text file
///
/// ```rust, no_run
/// # use ptools_fluence::{write_fluence_table, BandFluenceTable};
/// let table = BandFluenceTable::new();
/// write_fluence_table(&table, "cumulative_fluence.txt").unwrap();
/// ```
pub fn write_fluence_table<P: AsRef<Path>>(table: &BandFluenceTable, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_fluence(table, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write the table rows to any writer
pub fn write_fluence<W: Write>(table: &BandFluenceTable, writer: &mut W) -> Result<()> {
    writeln!(writer, "{FLUENCE_HEADER}")?;
    for (band, fluence) in table.iter() {
        writeln!(writer, "{band}\t{:.*}", FLUENCE_PRECISION, fluence)?;
    }
    Ok(())
}

/// Read a [BandFluenceTable] back from a tab-delimited text file
///
/// ```rust, no_run
/// # use ptools_fluence::read_fluence_table;
/// let table = read_fluence_table("cumulative_fluence.txt").unwrap();
/// println!("Total fluence: {}", table.total());
/// ```
pub fn read_fluence_table<P: AsRef<Path>>(path: P) -> Result<BandFluenceTable> {
    read_fluence(BufReader::new(File::open(path)?))
}

/// Read table rows from any reader, skipping the header row
pub fn read_fluence<R: Read>(reader: R) -> Result<BandFluenceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut table = BandFluenceTable::new();
    for record in reader.deserialize::<(String, f64)>() {
        let (label, fluence) = record?;
        if !fluence.is_finite() || fluence < 0.0 {
            return Err(Error::InvalidFluence {
                band: label,
                value: fluence,
            });
        }
        table.add(EnergyBand::from_label(&label)?, fluence);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(low: f64, high: f64) -> EnergyBand {
        EnergyBand::new(low, high).unwrap()
    }

    #[test]
    fn rows_are_ascending_by_low_energy() {
        let table: BandFluenceTable = [
            (band(6.5, 12.0), 3.0),
            (band(1.0, 1.9), 1.0),
            (band(1.9, 2.3), 2.0),
        ]
        .into_iter()
        .collect();

        let mut buffer = Vec::new();
        write_fluence(&table, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let expected = "Energy Band (MeV)\tTotal Fluence (particles/cm²)\n\
                        1.0-1.9\t1.0000\n\
                        1.9-2.3\t2.0000\n\
                        6.5-12.0\t3.0000\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn written_table_reads_back() {
        let table: BandFluenceTable = [(band(1.0, 1.9), 1234.5678), (band(40.0, 80.0), 0.0)]
            .into_iter()
            .collect();

        let mut buffer = Vec::new();
        write_fluence(&table, &mut buffer).unwrap();
        let read = read_fluence(buffer.as_slice()).unwrap();

        assert_eq!(read.len(), 2);
        assert_eq!(read.get(&band(1.0, 1.9)), Some(1234.5678));
        assert_eq!(read.get(&band(40.0, 80.0)), Some(0.0));
    }

    #[test]
    fn bad_rows_are_errors() {
        let text = "Energy Band (MeV)\tTotal Fluence (particles/cm²)\n1.9-1.0\t2.0\n";
        assert!(matches!(
            read_fluence(text.as_bytes()),
            Err(Error::DegenerateBand { .. })
        ));

        let text = "Energy Band (MeV)\tTotal Fluence (particles/cm²)\nP1\t2.0\n";
        assert!(matches!(
            read_fluence(text.as_bytes()),
            Err(Error::InvalidBandLabel(_))
        ));

        let text = "Energy Band (MeV)\tTotal Fluence (particles/cm²)\n1.0-1.9\tlots\n";
        assert!(matches!(read_fluence(text.as_bytes()), Err(Error::Csv(_))));
    }
}
