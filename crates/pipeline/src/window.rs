//! Observation window and measurement file discovery

// standard library
use std::fmt;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

// crate modules
use crate::error::{Error, Result};
use crate::parsers::file_date;

// ptools modules
use ptools_format::f;

// external crates
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

/// Inclusive ranges of years, months, and days to accumulate over
///
/// Months and days apply to every year in the window, so the default window
/// of 2020-2025, months 1-12, days 1-31 covers six complete years.
///
/// ```rust
/// # use ptools_pipeline::ObservationWindow;
/// let window = ObservationWindow {
///     years: (2020, 2021),
///     months: (1, 2),
///     days: (1, 15),
/// };
///
/// assert!(window.validate().is_ok());
/// assert!(window.contains(2021, 2, 15));
/// assert!(!window.contains(2021, 3, 1));
/// assert_eq!(window.to_string(), "2020-2021_1-2_1-15");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationWindow {
    /// First and last year
    pub years: (u16, u16),
    /// First and last month of each year, 1-12
    pub months: (u8, u8),
    /// First and last day of each month, 1-31
    pub days: (u8, u8),
}

impl Default for ObservationWindow {
    fn default() -> Self {
        Self {
            years: (2020, 2025),
            months: (1, 12),
            days: (1, 31),
        }
    }
}

impl ObservationWindow {
    /// Check every range is non-empty and inside the calendar
    pub fn validate(&self) -> Result<()> {
        Self::check_range("year", self.years.0, self.years.1, 1..=9999)?;
        Self::check_range("month", self.months.0.into(), self.months.1.into(), 1..=12)?;
        Self::check_range("day", self.days.0.into(), self.days.1.into(), 1..=31)?;
        Ok(())
    }

    /// Years in the window, in ascending order
    pub fn years(&self) -> RangeInclusive<u16> {
        self.years.0..=self.years.1
    }

    /// True if a calendar date falls inside the window
    pub fn contains(&self, year: u16, month: u8, day: u8) -> bool {
        self.years().contains(&year)
            && (self.months.0..=self.months.1).contains(&month)
            && (self.days.0..=self.days.1).contains(&day)
    }

    /// Default file name for the band fluence table of this window
    ///
    /// ```rust
    /// # use ptools_pipeline::ObservationWindow;
    /// assert_eq!(
    ///     ObservationWindow::default().fluence_file_name(),
    ///     "cumulative_fluence_2020-2025_1-12_1-31.txt"
    /// );
    /// ```
    pub fn fluence_file_name(&self) -> String {
        f!("cumulative_fluence_{}.txt", self)
    }

    fn check_range(
        field: &'static str,
        start: u16,
        end: u16,
        bounds: RangeInclusive<u16>,
    ) -> Result<()> {
        if start > end || !bounds.contains(&start) || !bounds.contains(&end) {
            return Err(Error::InvalidWindow { field, start, end });
        }
        Ok(())
    }
}

impl fmt::Display for ObservationWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}-{}_{}-{}_{}-{}",
            self.years.0, self.years.1, self.months.0, self.months.1, self.days.0, self.days.1
        )
    }
}

/// Enumerate measurement files under `<data_dir>/<year>/` for a window
///
/// Only `*.json` files are considered. Each year is listed in ascending
/// order, and the files of a year are sorted by name, so the result is
/// deterministic for a given directory tree.
///
/// Files named with a `_dYYYYMMDD` token are filtered on that date. Files
/// without one are kept on the strength of their year directory alone.
///
/// A missing year directory is only a warning, but finding no files at all
/// is an [Error::NoFilesInWindow].
pub fn discover_files<P: AsRef<Path>>(data_dir: P, window: &ObservationWindow) -> Result<Vec<PathBuf>> {
    let data_dir = data_dir.as_ref();
    let mut files = Vec::new();

    for year in window.years() {
        let year_dir = data_dir.join(year.to_string());
        if !year_dir.is_dir() {
            warn!("Directory for {year} not found: {}", year_dir.display());
            continue;
        }

        let mut year_files = list_year(&year_dir, year, window)?;
        debug!("Found {} files for {year}", year_files.len());
        files.append(&mut year_files);
    }

    if files.is_empty() {
        return Err(Error::NoFilesInWindow {
            data_dir: data_dir.to_path_buf(),
            window: window.to_string(),
        });
    }

    Ok(files)
}

/// Sorted measurement files of one year that fall inside the window
fn list_year(year_dir: &Path, year: u16, window: &ObservationWindow) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(year_dir).map_err(|source| Error::Discovery {
        path: year_dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == "json"))
        .filter(|path| in_window(path, year, window))
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn in_window(path: &Path, year: u16, window: &ObservationWindow) -> bool {
    let Some(date) = path.file_name().and_then(|n| n.to_str()).and_then(file_date) else {
        return true;
    };

    if date.year != year {
        warn!(
            "{} is dated {} but stored under {year}",
            path.display(),
            date.year
        );
    }

    let keep = window.contains(year, date.month, date.day);
    if !keep {
        trace!("Outside of window: {}", path.display());
    }
    keep
}
