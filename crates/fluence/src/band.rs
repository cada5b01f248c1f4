// standard library
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

// crate modules
use crate::error::{Error, Result};
use crate::parsers;

// ptools modules
use ptools_format::f;

// external crates
use serde::{Deserialize, Serialize};

/// Contiguous energy interval measured by a telescope (MeV)
///
/// Bands are ordered by their lower bound, then their upper bound, so they
/// can be used directly as map keys. Construction always checks that
/// `low < high`.
///
/// ```rust
/// # use ptools_fluence::EnergyBand;
/// let band = EnergyBand::new(1.0, 1.9).unwrap();
/// assert_eq!(band.to_string(), "1.0-1.9");
/// assert!((band.width() - 0.9).abs() < 1e-12);
///
/// // Degenerate bands are rejected
/// assert!(EnergyBand::new(2.0, 2.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "(f64, f64)", into = "(f64, f64)")]
pub struct EnergyBand {
    low: f64,
    high: f64,
}

impl EnergyBand {
    /// New band from lower and upper bounds in MeV
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !(low.is_finite() && high.is_finite()) || low >= high || low < 0.0 {
            return Err(Error::DegenerateBand { low, high });
        }
        Ok(Self { low, high })
    }

    /// Lower bound (MeV)
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Upper bound (MeV)
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Band width (MeV)
    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// True if the two bands share any part of their range
    ///
    /// Touching bands, where one upper bound is the next lower bound, do not
    /// overlap.
    pub fn overlaps(&self, other: &EnergyBand) -> bool {
        self.low < other.high && other.low < self.high
    }

    /// Parse a `<low>-<high>` label as written in fluence tables
    ///
    /// ```rust
    /// # use ptools_fluence::EnergyBand;
    /// let band = EnergyBand::from_label("12.0-25.0").unwrap();
    /// assert_eq!(band.low(), 12.0);
    /// assert_eq!(band.high(), 25.0);
    /// ```
    pub fn from_label(label: &str) -> Result<Self> {
        let (low, high) = parsers::band_label(label.trim())
            .map_err(|_| Error::InvalidBandLabel(label.to_string()))?;
        Self::new(low, high)
    }
}

impl TryFrom<(f64, f64)> for EnergyBand {
    type Error = Error;

    fn try_from(bounds: (f64, f64)) -> Result<Self> {
        Self::new(bounds.0, bounds.1)
    }
}

impl From<EnergyBand> for (f64, f64) {
    fn from(band: EnergyBand) -> Self {
        (band.low, band.high)
    }
}

impl PartialEq for EnergyBand {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EnergyBand {}

impl PartialOrd for EnergyBand {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EnergyBand {
    fn cmp(&self, other: &Self) -> Ordering {
        self.low
            .total_cmp(&other.low)
            .then(self.high.total_cmp(&other.high))
    }
}

impl fmt::Display for EnergyBand {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}-{}", bound(self.low), bound(self.high))
    }
}

/// Shortest round-trip decimal, always with a fractional part
fn bound(value: f64) -> String {
    if value.fract() == 0.0 {
        f!("{value:.1}")
    } else {
        f!("{value}")
    }
}

/// Telescope to energy band mapping for one instrument deployment
///
/// This is static configuration, and is the only source of truth for the
/// physical energy bounds of every bin. Labels embedded in measurement files
/// are only ever used for consistency warnings.
///
/// Bands for a telescope are kept in increasing energy order, and bands are
/// disjoint across every telescope. Both are checked on construction.
///
/// The default is the GOES-16 SGPS proton telescope set.
///
/// ```rust
/// # use ptools_fluence::EnergyBandTable;
/// let table = EnergyBandTable::default();
/// assert_eq!(table.band_count("T1"), Some(4));
/// assert_eq!(table.band_count("T3"), Some(6));
/// assert_eq!(table.band_count("T4"), None);
/// ```
///
/// Tables deserialise from a JSON object of `[low, high]` pairs:
///
/// ```json
/// {
///     "T1": [[1.0, 1.9], [1.9, 2.3]],
///     "T2": [[6.5, 12.0]]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Vec<EnergyBand>>",
    into = "BTreeMap<String, Vec<EnergyBand>>"
)]
pub struct EnergyBandTable {
    telescopes: BTreeMap<String, Vec<EnergyBand>>,
}

impl EnergyBandTable {
    /// Build a validated table from telescope ids and their bands
    ///
    /// Bands are sorted into increasing energy order for each telescope.
    pub fn new(telescopes: BTreeMap<String, Vec<EnergyBand>>) -> Result<Self> {
        let mut telescopes = telescopes;
        for (telescope, bands) in telescopes.iter_mut() {
            if bands.is_empty() {
                return Err(Error::EmptyTelescope(telescope.clone()));
            }
            bands.sort();
        }

        // every band must be disjoint from every other, across all telescopes
        let mut all: Vec<EnergyBand> = telescopes.values().flatten().copied().collect();
        all.sort();
        for pair in all.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(Error::OverlappingBands {
                    first: pair[0].to_string(),
                    second: pair[1].to_string(),
                });
            }
        }

        Ok(Self { telescopes })
    }

    /// Build a table from raw `(low, high)` pairs
    ///
    /// ```rust
    /// # use ptools_fluence::EnergyBandTable;
    /// let table = EnergyBandTable::from_bounds([("T1", vec![(1.0, 1.9), (1.9, 2.3)])]).unwrap();
    /// assert_eq!(table.band_count("T1"), Some(2));
    /// ```
    pub fn from_bounds<I, S>(telescopes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<(f64, f64)>)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (telescope, bounds) in telescopes {
            let bands = bounds
                .into_iter()
                .map(EnergyBand::try_from)
                .collect::<Result<Vec<EnergyBand>>>()?;
            map.insert(telescope.into(), bands);
        }
        Self::new(map)
    }

    /// Ordered bands of a telescope, if configured
    pub fn bands(&self, telescope: &str) -> Option<&[EnergyBand]> {
        self.telescopes.get(telescope).map(|b| b.as_slice())
    }

    /// Number of bands configured for a telescope
    pub fn band_count(&self, telescope: &str) -> Option<usize> {
        self.telescopes.get(telescope).map(|b| b.len())
    }

    /// Configured telescope identifiers, sorted
    pub fn telescopes(&self) -> impl Iterator<Item = &str> {
        self.telescopes.keys().map(|t| t.as_str())
    }

    /// Every `(telescope, band)` pair in ascending energy order
    pub fn iter(&self) -> impl Iterator<Item = (&str, EnergyBand)> {
        let mut all: Vec<(&str, EnergyBand)> = self
            .telescopes
            .iter()
            .flat_map(|(t, bands)| bands.iter().map(move |b| (t.as_str(), *b)))
            .collect();
        all.sort_by(|a, b| a.1.cmp(&b.1));
        all.into_iter()
    }

    /// Total number of bands over all telescopes
    pub fn len(&self) -> usize {
        self.telescopes.values().map(|b| b.len()).sum()
    }

    /// True if no telescopes are configured
    pub fn is_empty(&self) -> bool {
        self.telescopes.is_empty()
    }
}

impl Default for EnergyBandTable {
    fn default() -> Self {
        let mut telescopes = BTreeMap::new();
        telescopes.insert("T1".to_string(), bands(&[1.0, 1.9, 2.3, 3.4, 6.5]));
        telescopes.insert("T2".to_string(), bands(&[6.5, 12.0, 25.0, 40.0]));
        telescopes.insert(
            "T3".to_string(),
            bands(&[40.0, 80.0, 99.0, 118.0, 150.0, 275.0, 500.0]),
        );
        Self { telescopes }
    }
}

/// Contiguous bands from a list of ascending edges
fn bands(edges: &[f64]) -> Vec<EnergyBand> {
    edges
        .windows(2)
        .map(|e| EnergyBand {
            low: e[0],
            high: e[1],
        })
        .collect()
}

impl TryFrom<BTreeMap<String, Vec<EnergyBand>>> for EnergyBandTable {
    type Error = Error;

    fn try_from(telescopes: BTreeMap<String, Vec<EnergyBand>>) -> Result<Self> {
        Self::new(telescopes)
    }
}

impl From<EnergyBandTable> for BTreeMap<String, Vec<EnergyBand>> {
    fn from(table: EnergyBandTable) -> Self {
        table.telescopes
    }
}
