// ptools modules
use ptools_fluence::EnergyBand;

/// Fine sub-division of an energy band in a synthesized spectrum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubBin {
    /// Representative energy, the geometric mean of the boundaries (MeV)
    pub energy: f64,
    /// Probability density (1/MeV)
    pub density: f64,
    /// Width of the sub-bin (MeV)
    pub width: f64,
    /// Band the sub-bin was split from
    pub band: EnergyBand,
}

impl SubBin {
    /// Probability mass of the sub-bin, `density * width`
    pub fn probability(&self) -> f64 {
        self.density * self.width
    }
}

/// Normalised energy spectrum made of [SubBin]s in ascending energy order
///
/// The width-weighted sum of densities over the full spectrum is 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    sub_bins: Vec<SubBin>,
    total_share: f64,
}

impl Spectrum {
    pub(crate) fn new(sub_bins: Vec<SubBin>, total_share: f64) -> Self {
        Self {
            sub_bins,
            total_share,
        }
    }

    /// Sub-bins in ascending energy order
    pub fn sub_bins(&self) -> &[SubBin] {
        &self.sub_bins
    }

    /// Consume into the list of sub-bins
    pub fn into_sub_bins(self) -> Vec<SubBin> {
        self.sub_bins
    }

    /// Sum of un-normalised shares over every sub-bin
    ///
    /// This equals the total fluence over every configured band.
    pub fn total_share(&self) -> f64 {
        self.total_share
    }

    /// Share of the fluence carried by a sub-bin before normalisation
    pub fn share(&self, sub_bin: &SubBin) -> f64 {
        sub_bin.probability() * self.total_share
    }

    /// Width-weighted sum of densities, which should always be ~1
    pub fn integral(&self) -> f64 {
        self.sub_bins.iter().map(|b| b.probability()).sum()
    }

    /// Total probability of the sub-bins split from `band`
    pub fn band_probability(&self, band: &EnergyBand) -> f64 {
        self.band_sub_bins(band).map(|b| b.probability()).sum()
    }

    /// Sub-bins split from `band`, in ascending energy order
    pub fn band_sub_bins<'a>(&'a self, band: &'a EnergyBand) -> impl Iterator<Item = &'a SubBin> {
        self.sub_bins.iter().filter(move |b| b.band == *band)
    }

    /// Number of sub-bins
    pub fn len(&self) -> usize {
        self.sub_bins.len()
    }

    /// True if there are no sub-bins
    pub fn is_empty(&self) -> bool {
        self.sub_bins.is_empty()
    }
}
