use crate::geometry;
use crate::{Error, Result};

/// Speed samples collected over a run, in the order they were produced.
///
/// The accumulator is owned by whoever drives the run and is consumed once by
/// [`RunAccumulator::finalize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunAccumulator {
    samples: Vec<f64>,
}

impl RunAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, speed: f64) {
        self.samples.push(speed);
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The mean of all collected samples.
    ///
    /// Fails with [`Error::NoSamplesCollected`] if nothing was collected.
    pub fn finalize(self) -> Result<f64> {
        geometry::mean(self.samples).ok_or(Error::NoSamplesCollected)
    }
}

impl FromIterator<f64> for RunAccumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl Extend<f64> for RunAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        self.samples.extend(iter);
    }
}

/// Same as [`RunAccumulator::finalize`].
pub fn finalize_run(accumulator: RunAccumulator) -> Result<f64> {
    accumulator.finalize()
}

/// The fixed-point representation handed to result sinks: four decimals.
pub fn format_speed(speed: f64) -> String {
    format!("{:.4}", speed)
}
