// standard library
use std::collections::BTreeMap;

// crate modules
use crate::error::{Error, Result};
use crate::reader::{shape_of, RawFluxSample};

/// Running totals for a single telescope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelescopeTotals {
    /// Summed flux, `[direction][energy_bin]`
    pub values: Vec<Vec<f64>>,
    /// Number of files absorbed
    pub files: usize,
    /// Number of time steps absorbed over all files
    pub time_steps: usize,
}

impl TelescopeTotals {
    /// Shape of the totals as `(directions, energy_bins)`
    pub fn shape(&self) -> (usize, usize) {
        shape_of(&self.values)
    }

    /// Totals summed over every direction, one value per energy bin
    ///
    /// ```rust
    /// # use ptools_fluence::TelescopeTotals;
    /// let totals = TelescopeTotals::from(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    /// assert_eq!(totals.direction_summed(), vec![4.0, 6.0]);
    /// ```
    pub fn direction_summed(&self) -> Vec<f64> {
        let mut summed = vec![0.0; self.shape().1];
        for direction in &self.values {
            for (s, v) in summed.iter_mut().zip(direction) {
                *s += v;
            }
        }
        summed
    }
}

impl From<Vec<Vec<f64>>> for TelescopeTotals {
    fn from(values: Vec<Vec<f64>>) -> Self {
        Self {
            values,
            ..Default::default()
        }
    }
}

/// Per-telescope cumulative flux over every file in an observation window
///
/// The accumulator is the only mutable state in a pipeline run. Each telescope
/// total is shaped lazily from the first array absorbed for it, and every
/// later array must have exactly the same `[direction][energy_bin]` shape.
/// Mismatched shapes are an error rather than being truncated or padded.
///
/// Absorbing is commutative, so files may be processed in any order. Every
/// successful [absorb()](FluenceAccumulator::absorb) leaves the totals in a
/// valid partial state.
///
/// ```rust
/// # use ptools_fluence::FluenceAccumulator;
/// let mut accumulator = FluenceAccumulator::new();
/// accumulator.absorb("T1", &[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
/// accumulator.absorb("T1", &[vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();
///
/// let totals = accumulator.totals();
/// assert_eq!(totals["T1"].values, vec![vec![6.0, 8.0], vec![10.0, 12.0]]);
///
/// // A different shape for the same telescope is refused
/// assert!(accumulator.absorb("T1", &[vec![1.0, 2.0, 3.0]]).is_err());
/// ```
#[derive(Debug, Default)]
pub struct FluenceAccumulator {
    totals: BTreeMap<String, TelescopeTotals>,
}

impl FluenceAccumulator {
    /// Empty accumulator with no telescopes
    pub fn new() -> Self {
        Default::default()
    }

    /// Add one time-summed `[direction][energy_bin]` array for a telescope
    pub fn absorb(&mut self, telescope: &str, values: &[Vec<f64>]) -> Result<()> {
        let found = shape_of(values);
        if values.iter().any(|row| row.len() != found.1) {
            return Err(Error::RaggedArray(telescope.to_string()));
        }

        let totals = self
            .totals
            .entry(telescope.to_string())
            .or_insert_with(|| TelescopeTotals::from(vec![vec![0.0; found.1]; found.0]));

        let expected = totals.shape();
        if expected != found {
            return Err(Error::ShapeMismatch {
                telescope: telescope.to_string(),
                expected,
                found,
            });
        }

        for (total, row) in totals.values.iter_mut().zip(values) {
            for (t, v) in total.iter_mut().zip(row) {
                *t += v;
            }
        }

        totals.files += 1;
        Ok(())
    }

    /// Absorb a sample read from a measurement file, tracking its time steps
    pub fn absorb_sample(&mut self, sample: &RawFluxSample) -> Result<()> {
        self.absorb(&sample.telescope, &sample.values)?;
        if let Some(totals) = self.totals.get_mut(&sample.telescope) {
            totals.time_steps += sample.time_steps;
        }
        Ok(())
    }

    /// Current totals for every telescope seen so far
    pub fn totals(&self) -> &BTreeMap<String, TelescopeTotals> {
        &self.totals
    }

    /// Consume the accumulator, keeping only the final totals
    pub fn into_totals(self) -> BTreeMap<String, TelescopeTotals> {
        self.totals
    }

    /// True if nothing has been absorbed yet
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(telescope: &str, values: Vec<Vec<f64>>, time_steps: usize) -> RawFluxSample {
        RawFluxSample {
            telescope: telescope.to_string(),
            values,
            time_steps,
        }
    }

    #[test]
    fn first_absorb_sets_shape() {
        let mut accumulator = FluenceAccumulator::new();
        assert!(accumulator.is_empty());

        accumulator.absorb("T2", &[vec![1.0, 2.0, 3.0]]).unwrap();
        assert_eq!(accumulator.totals()["T2"].shape(), (1, 3));
        assert_eq!(accumulator.totals()["T2"].files, 1);
    }

    #[test]
    fn shape_mismatch_names_telescope() {
        let mut accumulator = FluenceAccumulator::new();
        accumulator.absorb("T1", &[vec![1.0, 2.0]]).unwrap();

        match accumulator.absorb("T1", &[vec![1.0, 2.0], vec![3.0, 4.0]]) {
            Err(Error::ShapeMismatch {
                telescope,
                expected,
                found,
            }) => {
                assert_eq!(telescope, "T1");
                assert_eq!(expected, (1, 2));
                assert_eq!(found, (2, 2));
            }
            other => panic!("expected a shape mismatch, found {other:?}"),
        }

        // totals are untouched by the failed absorb
        assert_eq!(accumulator.totals()["T1"].values, vec![vec![1.0, 2.0]]);
        assert_eq!(accumulator.totals()["T1"].files, 1);
    }

    #[test]
    fn ragged_input_is_refused() {
        let mut accumulator = FluenceAccumulator::new();
        let result = accumulator.absorb("T1", &[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(Error::RaggedArray(_))));
        assert!(accumulator.is_empty());
    }

    #[test]
    fn telescopes_are_independent() {
        let mut accumulator = FluenceAccumulator::new();
        accumulator.absorb("T1", &[vec![1.0, 2.0]]).unwrap();
        accumulator.absorb("T3", &[vec![1.0], vec![2.0]]).unwrap();
        accumulator.absorb("T1", &[vec![1.0, 1.0]]).unwrap();

        let totals = accumulator.into_totals();
        assert_eq!(totals["T1"].values, vec![vec![2.0, 3.0]]);
        assert_eq!(totals["T3"].values, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn samples_track_time_steps() {
        let mut accumulator = FluenceAccumulator::new();
        accumulator
            .absorb_sample(&sample("T1", vec![vec![1.0]], 288))
            .unwrap();
        accumulator
            .absorb_sample(&sample("T1", vec![vec![2.0]], 100))
            .unwrap();

        let totals = &accumulator.totals()["T1"];
        assert_eq!(totals.files, 2);
        assert_eq!(totals.time_steps, 388);
        assert_eq!(totals.values, vec![vec![3.0]]);
    }

    #[test]
    fn direction_sum_of_empty_totals() {
        assert!(TelescopeTotals::default().direction_summed().is_empty());
    }
}
