// standard library
use std::collections::BTreeMap;

// crate modules
use crate::accumulator::TelescopeTotals;
use crate::band::EnergyBandTable;
use crate::error::{Error, Result};
use crate::table::BandFluenceTable;

// external crates
use log::{debug, warn};

/// Conversion of accumulated telescope totals into physical band fluence
///
/// For every telescope in the totals:
///
/// 1. Sum over every direction to get one value per energy bin
/// 2. Match bins 1:1, in order, to the bands configured for the telescope
/// 3. Apply `fluence = summed_flux * scaling_factor * (high - low)`
///
/// The scaling factor folds together the measurement time interval, the
/// solid angle normalisation, and the unit conversion to particles/cm². It is
/// a constant of the instrument geometry and is the same for every band.
///
/// Telescopes without any configured bands are skipped with a warning. Bins
/// beyond the configured band count are ignored with a warning, but fewer bins
/// than bands is an error.
///
/// ```rust
/// # use std::collections::BTreeMap;
/// # use ptools_fluence::{BandFluenceCalculator, EnergyBand, EnergyBandTable, TelescopeTotals};
/// let table = EnergyBandTable::from_bounds([("T1", vec![(1.0, 2.0), (2.0, 4.0)])]).unwrap();
///
/// let mut totals = BTreeMap::new();
/// totals.insert("T1".to_string(), TelescopeTotals::from(vec![vec![1.0, 1.0], vec![1.0, 2.0]]));
///
/// let fluence = BandFluenceCalculator::new(&table, 10.0)
///     .unwrap()
///     .compute(&totals)
///     .unwrap();
///
/// assert_eq!(fluence.get(&EnergyBand::new(1.0, 2.0).unwrap()), Some(20.0));
/// assert_eq!(fluence.get(&EnergyBand::new(2.0, 4.0).unwrap()), Some(60.0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BandFluenceCalculator<'a> {
    table: &'a EnergyBandTable,
    scaling_factor: f64,
}

impl<'a> BandFluenceCalculator<'a> {
    /// Calculator for the bands in `table`, rejecting unusable scaling factors
    pub fn new(table: &'a EnergyBandTable, scaling_factor: f64) -> Result<Self> {
        if !scaling_factor.is_finite() || scaling_factor <= 0.0 {
            return Err(Error::InvalidScalingFactor(scaling_factor));
        }
        Ok(Self {
            table,
            scaling_factor,
        })
    }

    /// Physical fluence for every band with accumulated data
    pub fn compute(&self, totals: &BTreeMap<String, TelescopeTotals>) -> Result<BandFluenceTable> {
        let mut fluence = BandFluenceTable::new();

        for (telescope, telescope_totals) in totals {
            let Some(bands) = self.table.bands(telescope) else {
                warn!("No energy bands configured for {telescope}, skipping its data");
                continue;
            };

            let summed = telescope_totals.direction_summed();
            if summed.len() < bands.len() {
                return Err(Error::BandCountMismatch {
                    telescope: telescope.clone(),
                    expected: bands.len(),
                    found: summed.len(),
                });
            }

            if summed.len() > bands.len() {
                warn!(
                    "{telescope} has {} energy bins but only {} bands, ignoring the extra bins",
                    summed.len(),
                    bands.len()
                );
            }

            for (band, flux) in bands.iter().zip(&summed) {
                let value = flux * self.scaling_factor * band.width();
                debug!("{telescope} {band} MeV: {value}");
                fluence.add(*band, value);
            }
        }

        Ok(fluence)
    }

    /// The scaling factor applied to every band
    pub fn scaling_factor(&self) -> f64 {
        self.scaling_factor
    }
}

/// Physical fluence per band from accumulated telescope totals
///
/// Convenience for [BandFluenceCalculator] when only one set of totals is
/// converted.
pub fn compute_fluence(
    totals: &BTreeMap<String, TelescopeTotals>,
    table: &EnergyBandTable,
    scaling_factor: f64,
) -> Result<BandFluenceTable> {
    BandFluenceCalculator::new(table, scaling_factor)?.compute(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::EnergyBand;

    fn totals(entries: &[(&str, Vec<Vec<f64>>)]) -> BTreeMap<String, TelescopeTotals> {
        entries
            .iter()
            .map(|(t, v)| (t.to_string(), TelescopeTotals::from(v.clone())))
            .collect()
    }

    #[test]
    fn scaling_factor_must_be_positive() {
        let table = EnergyBandTable::default();
        assert!(BandFluenceCalculator::new(&table, 0.0).is_err());
        assert!(BandFluenceCalculator::new(&table, -1.0).is_err());
        assert!(BandFluenceCalculator::new(&table, f64::NAN).is_err());
        assert!(BandFluenceCalculator::new(&table, 552000.0).is_ok());
    }

    #[test]
    fn directions_are_summed_before_scaling() {
        let table = EnergyBandTable::from_bounds([("T1", vec![(1.0, 1.5)])]).unwrap();
        let calculator = BandFluenceCalculator::new(&table, 4.0).unwrap();

        let fluence = calculator
            .compute(&totals(&[("T1", vec![vec![1.0], vec![2.0], vec![3.0]])]))
            .unwrap();

        // (1 + 2 + 3) * 4 * 0.5
        assert_eq!(fluence.get(&EnergyBand::new(1.0, 1.5).unwrap()), Some(12.0));
    }

    #[test]
    fn extra_bins_are_ignored() {
        let table = EnergyBandTable::from_bounds([("T1", vec![(1.0, 2.0)])]).unwrap();
        let calculator = BandFluenceCalculator::new(&table, 1.0).unwrap();

        let fluence = calculator
            .compute(&totals(&[("T1", vec![vec![5.0, 100.0]])]))
            .unwrap();

        assert_eq!(fluence.len(), 1);
        assert_eq!(fluence.total(), 5.0);
    }

    #[test]
    fn missing_bins_are_an_error() {
        let table = EnergyBandTable::from_bounds([("T1", vec![(1.0, 2.0), (2.0, 3.0)])]).unwrap();
        let calculator = BandFluenceCalculator::new(&table, 1.0).unwrap();

        let result = calculator.compute(&totals(&[("T1", vec![vec![5.0]])]));
        assert!(matches!(
            result,
            Err(Error::BandCountMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn unknown_telescopes_are_skipped() {
        let table = EnergyBandTable::from_bounds([("T1", vec![(1.0, 2.0)])]).unwrap();
        let calculator = BandFluenceCalculator::new(&table, 1.0).unwrap();

        let fluence = calculator
            .compute(&totals(&[("T1", vec![vec![1.0]]), ("T9", vec![vec![7.0]])]))
            .unwrap();

        assert_eq!(fluence.len(), 1);
        assert_eq!(fluence.total(), 1.0);
    }

    #[test]
    fn bands_from_every_telescope_are_kept() {
        let table = EnergyBandTable::default();
        let calculator = BandFluenceCalculator::new(&table, 1.0).unwrap();

        let fluence = calculator
            .compute(&totals(&[
                ("T1", vec![vec![1.0; 4]]),
                ("T2", vec![vec![1.0; 3]]),
                ("T3", vec![vec![1.0; 6]]),
            ]))
            .unwrap();

        assert_eq!(fluence.len(), table.len());
        // with unit flux and scaling the fluence is the total instrument range
        assert!((fluence.total() - (500.0 - 1.0)).abs() < 1e-9);

        let lows: Vec<f64> = fluence.iter().map(|(b, _)| b.low()).collect();
        assert!(lows.windows(2).all(|w| w[0] < w[1]));
    }
}
