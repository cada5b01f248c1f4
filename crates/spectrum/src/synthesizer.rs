// crate modules
use crate::error::{Error, Result};
use crate::subbin::{Spectrum, SubBin};

// ptools modules
use ptools_fluence::{BandFluenceTable, EnergyBand, EnergyBandTable};

// external crates
use itertools::Itertools;
use log::{debug, warn};

/// Power-law sub-binning of banded fluence into a normalised energy PDF
///
/// Every configured band is divided into `sub_bins_per_band` log-spaced
/// sub-bins. Log spacing resolves the low energy end of the band, where a
/// steeply falling spectrum puts most of its probability mass.
///
/// For a band `[low, high]` with fluence `F`:
///
/// 1. Boundaries are `low * (high / low)^(i / n)` for `i = 0..=n`
/// 2. The sub-bin energy is the geometric mean of its boundaries
/// 3. Weights are `energy^(-gamma)`, normalised to sum to 1 within the band
///
/// Weights are formed in log space relative to the largest weight in the band,
/// so any finite `gamma` gives finite weights no matter how far the band is
/// from 1 MeV.
/// 4. The sub-bin share of the band fluence is `F * weight`
///
/// Once every band is processed, the density of each sub-bin is
/// `share / (total_share * width)`, so that `Σ density * width = 1` over the
/// whole spectrum.
///
/// A configured band with no entry in the fluence table has zero fluence. Its
/// sub-bins all have zero density, and a warning is raised.
///
/// ```rust
/// # use ptools_fluence::{BandFluenceTable, EnergyBand, EnergyBandTable};
/// # use ptools_spectrum::SpectrumSynthesizer;
/// let table = EnergyBandTable::from_bounds([("T1", vec![(1.0, 1.9), (1.9, 2.3)])]).unwrap();
///
/// let mut fluence = BandFluenceTable::new();
/// fluence.add(EnergyBand::new(1.0, 1.9).unwrap(), 1000.0);
/// fluence.add(EnergyBand::new(1.9, 2.3).unwrap(), 250.0);
///
/// let spectrum = SpectrumSynthesizer::new(2.5, 10)
///     .unwrap()
///     .synthesize(&fluence, &table)
///     .unwrap();
///
/// assert_eq!(spectrum.len(), 20);
/// assert!((spectrum.integral() - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumSynthesizer {
    gamma: f64,
    sub_bins_per_band: usize,
}

impl SpectrumSynthesizer {
    /// Synthesizer for power-law index `gamma` and `sub_bins_per_band`
    ///
    /// Degenerate parameters are rejected here, before any data are touched.
    pub fn new(gamma: f64, sub_bins_per_band: usize) -> Result<Self> {
        if !gamma.is_finite() {
            return Err(Error::InvalidGamma(gamma));
        }

        if sub_bins_per_band == 0 {
            return Err(Error::InvalidSubBinCount(sub_bins_per_band));
        }

        Ok(Self {
            gamma,
            sub_bins_per_band,
        })
    }

    /// Power-law index
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Number of sub-bins each band is divided into
    pub fn sub_bins_per_band(&self) -> usize {
        self.sub_bins_per_band
    }

    /// Normalised spectrum over every band in `table`
    pub fn synthesize(&self, fluence: &BandFluenceTable, table: &EnergyBandTable) -> Result<Spectrum> {
        // fluence for bands nobody asked for is dropped, but worth knowing about
        for (band, _) in fluence.iter() {
            if !table.iter().any(|(_, b)| b == *band) {
                warn!("Fluence for {band} MeV is not in any configured band, ignoring");
            }
        }

        let mut shares: Vec<(SubBin, f64)> = Vec::with_capacity(table.len() * self.sub_bins_per_band);
        for (telescope, band) in table.iter() {
            let band_fluence = match fluence.get(&band) {
                Some(f) => f,
                None => {
                    warn!("No fluence for {telescope} band {band} MeV, assuming zero");
                    0.0
                }
            };

            if !band_fluence.is_finite() || band_fluence < 0.0 {
                return Err(Error::InvalidFluence {
                    band: band.to_string(),
                    value: band_fluence,
                });
            }

            shares.extend(self.split_band(&band, band_fluence)?);
        }

        let total_share: f64 = shares.iter().map(|(_, s)| s).sum();
        if !total_share.is_finite() {
            return Err(Error::NonFiniteTotal(total_share));
        }
        if total_share <= 0.0 {
            return Err(Error::NoFluence);
        }
        debug!("Total share over {} sub-bins: {total_share}", shares.len());

        let mut sub_bins: Vec<SubBin> = shares
            .into_iter()
            .map(|(mut bin, share)| {
                bin.density = share / (total_share * bin.width);
                bin
            })
            .collect();

        sub_bins.sort_by(|a, b| a.energy.total_cmp(&b.energy));
        Ok(Spectrum::new(sub_bins, total_share))
    }

    /// Sub-bins of one band, paired with their share of the band fluence
    ///
    /// Densities are left at zero until the total share is known.
    fn split_band(&self, band: &EnergyBand, fluence: f64) -> Result<Vec<(SubBin, f64)>> {
        let edges = log_edges(band, self.sub_bins_per_band)?;

        let bins: Vec<SubBin> = edges
            .into_iter()
            .tuple_windows()
            .map(|(lower, upper)| SubBin {
                energy: (lower * upper).sqrt(),
                density: 0.0,
                width: upper - lower,
                band: *band,
            })
            .collect();

        let weights = power_law_weights(&bins, self.gamma);
        let weight_sum: f64 = weights.iter().sum();
        if !weight_sum.is_finite() || weight_sum <= 0.0 {
            return Err(Error::DegenerateWeights {
                band: band.to_string(),
                gamma: self.gamma,
            });
        }

        Ok(bins
            .into_iter()
            .zip(weights)
            .map(|(bin, w)| (bin, fluence * w / weight_sum))
            .collect())
    }
}

/// `energy^(-gamma)` for each sub-bin, scaled so the largest weight is 1
fn power_law_weights(bins: &[SubBin], gamma: f64) -> Vec<f64> {
    let log_weights: Vec<f64> = bins.iter().map(|b| -gamma * b.energy.ln()).collect();
    let max = log_weights
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    log_weights.into_iter().map(|w| (w - max).exp()).collect()
}

/// Geometrically spaced boundaries from `low` to `high`, inclusive
///
/// The final edge is set to exactly `high` so that adjacent bands stay
/// contiguous.
pub fn log_edges(band: &EnergyBand, n: usize) -> Result<Vec<f64>> {
    if band.low() <= 0.0 {
        return Err(Error::ZeroLowerBound(band.to_string()));
    }

    if n == 0 {
        return Err(Error::InvalidSubBinCount(n));
    }

    let ratio = band.high() / band.low();
    let mut edges: Vec<f64> = (0..=n)
        .map(|i| band.low() * ratio.powf(i as f64 / n as f64))
        .collect();

    edges[0] = band.low();
    edges[n] = band.high();
    Ok(edges)
}

/// Normalised spectrum from a fluence table, see [SpectrumSynthesizer]
pub fn synthesize(
    fluence: &BandFluenceTable,
    table: &EnergyBandTable,
    gamma: f64,
    sub_bins_per_band: usize,
) -> Result<Spectrum> {
    SpectrumSynthesizer::new(gamma, sub_bins_per_band)?.synthesize(fluence, table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(low: f64, high: f64) -> EnergyBand {
        EnergyBand::new(low, high).unwrap()
    }

    #[test]
    fn parameters_are_checked_up_front() {
        assert!(matches!(
            SpectrumSynthesizer::new(2.5, 0),
            Err(Error::InvalidSubBinCount(0))
        ));
        assert!(matches!(
            SpectrumSynthesizer::new(f64::NAN, 10),
            Err(Error::InvalidGamma(_))
        ));
        assert!(SpectrumSynthesizer::new(0.0, 1).is_ok());
    }

    #[test]
    fn edges_are_geometric() {
        let edges = log_edges(&band(1.0, 100.0), 2).unwrap();
        assert_eq!(edges[0], 1.0);
        assert!((edges[1] - 10.0).abs() < 1e-12);
        assert_eq!(edges[2], 100.0);

        let edges = log_edges(&band(1.0, 1.9), 10).unwrap();
        let ratios: Vec<f64> = edges.windows(2).map(|w| w[1] / w[0]).collect();
        assert!(ratios.iter().all(|r| (r - ratios[0]).abs() < 1e-12));
    }

    #[test]
    fn zero_lower_bound_can_not_be_log_spaced() {
        assert!(matches!(
            log_edges(&band(0.0, 1.0), 10),
            Err(Error::ZeroLowerBound(_))
        ));
    }

    #[test]
    fn midpoints_are_geometric_means() {
        let synthesizer = SpectrumSynthesizer::new(2.0, 1).unwrap();
        let bins = synthesizer.split_band(&band(1.0, 4.0), 1.0).unwrap();
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].0.energy, 2.0);
        assert_eq!(bins[0].0.width, 3.0);
        assert_eq!(bins[0].1, 1.0);
    }

    #[test]
    fn band_shares_sum_to_band_fluence() {
        let synthesizer = SpectrumSynthesizer::new(3.0, 10).unwrap();
        let bins = synthesizer.split_band(&band(1.0, 1.9), 1000.0).unwrap();

        let total: f64 = bins.iter().map(|(_, s)| s).sum();
        assert!((total - 1000.0).abs() < 1e-9);

        // steeply falling, so every share is smaller than the one before
        assert!(bins.windows(2).all(|w| w[1].1 < w[0].1));
    }

    #[test]
    fn flat_spectrum_with_zero_gamma() {
        let synthesizer = SpectrumSynthesizer::new(0.0, 4).unwrap();
        let bins = synthesizer.split_band(&band(1.0, 16.0), 8.0).unwrap();
        assert!(bins.iter().all(|(_, s)| (s - 2.0).abs() < 1e-12));
    }

    #[test]
    fn extreme_gamma_keeps_weights_finite() {
        for gamma in [-150.0, 200.0, 1.0e4] {
            let synthesizer = SpectrumSynthesizer::new(gamma, 10).unwrap();
            let bins = synthesizer.split_band(&band(40.0, 80.0), 500.0).unwrap();
            assert!(bins.iter().all(|(_, s)| s.is_finite() && *s >= 0.0));

            let total: f64 = bins.iter().map(|(_, s)| s).sum();
            assert!((total - 500.0).abs() < 1e-9, "gamma {gamma}: {total}");
        }
    }

    #[test]
    fn overflowing_total_is_an_error() {
        let table = EnergyBandTable::from_bounds([("T1", vec![(1.0, 2.0), (2.0, 3.0)])]).unwrap();
        let fluence: BandFluenceTable = [(band(1.0, 2.0), f64::MAX), (band(2.0, 3.0), f64::MAX)]
            .into_iter()
            .collect();
        let result = synthesize(&fluence, &table, 2.5, 10);
        assert!(matches!(result, Err(Error::NonFiniteTotal(_))));
    }

    #[test]
    fn all_zero_fluence_is_an_error() {
        let table = EnergyBandTable::from_bounds([("T1", vec![(1.0, 2.0)])]).unwrap();
        let result = synthesize(&BandFluenceTable::new(), &table, 2.5, 10);
        assert!(matches!(result, Err(Error::NoFluence)));
    }

    #[test]
    fn negative_fluence_is_an_error() {
        let table = EnergyBandTable::from_bounds([("T1", vec![(1.0, 2.0)])]).unwrap();
        let fluence: BandFluenceTable = [(band(1.0, 2.0), -5.0)].into_iter().collect();
        let result = synthesize(&fluence, &table, 2.5, 10);
        assert!(matches!(result, Err(Error::InvalidFluence { .. })));
    }
}
