use crate::displacement::coordinate_pairs;
use crate::{speed_km_per_sec, DisplacementEstimator, FeatureMatcher, Result, RunAccumulator};
use core::num::NonZeroUsize;
use image::GrayImage;
use log::*;

/// Runs matching, displacement estimation and speed conversion for image pairs.
///
/// The pipeline itself holds no per-run state. Samples are collected in a
/// [`RunAccumulator`] owned by the caller.
#[derive(Debug, Clone)]
pub struct Pipeline<M, E> {
    matcher: M,
    estimator: E,
    ground_sample_distance: f64,
    max_matches: Option<NonZeroUsize>,
}

impl<M, E> Pipeline<M, E> {
    /// `ground_sample_distance` is in centimetres per pixel.
    pub fn new(matcher: M, estimator: E, ground_sample_distance: f64) -> Self {
        Self {
            matcher,
            estimator,
            ground_sample_distance,
            max_matches: None,
        }
    }

    /// Only use the `count` best correspondences of each pair.
    pub fn max_matches(self, count: NonZeroUsize) -> Self {
        Self {
            max_matches: Some(count),
            ..self
        }
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn ground_sample_distance(&self) -> f64 {
        self.ground_sample_distance
    }

    pub fn match_limit(&self) -> Option<NonZeroUsize> {
        self.max_matches
    }
}

impl<M, E> Pipeline<M, E>
where
    M: FeatureMatcher,
    E: DisplacementEstimator,
{
    /// The representative pixel displacement between two images.
    pub fn displacement(&self, image_a: &GrayImage, image_b: &GrayImage) -> Result<f64> {
        let mut matches = self.matcher.match_features(image_a, image_b);
        if let Some(count) = self.max_matches {
            matches.truncate(count.get());
        }
        let pairs = coordinate_pairs(
            &matches.correspondences,
            &matches.keypoints_a,
            &matches.keypoints_b,
        )?;
        let displacement = self.estimator.estimate(&pairs)?;
        debug!(
            "displacement {:.3} px over {} correspondences",
            displacement,
            pairs.len()
        );
        Ok(displacement)
    }

    /// Ground speed in km/s for two images captured `elapsed_seconds` apart.
    pub fn process_pair(
        &self,
        image_a: &GrayImage,
        image_b: &GrayImage,
        elapsed_seconds: f64,
    ) -> Result<f64> {
        let displacement = self.displacement(image_a, image_b)?;
        speed_km_per_sec(displacement, self.ground_sample_distance, elapsed_seconds)
    }

    /// Like [`Pipeline::process_pair`], and on success the speed is appended
    /// to `accumulator`.
    ///
    /// A failed pair is logged and leaves `accumulator` untouched; the error
    /// is still returned so the caller can count it.
    pub fn accumulate(
        &self,
        accumulator: &mut RunAccumulator,
        image_a: &GrayImage,
        image_b: &GrayImage,
        elapsed_seconds: f64,
    ) -> Result<f64> {
        let result = self.process_pair(image_a, image_b, elapsed_seconds);
        match &result {
            Ok(speed) => {
                info!("sample {}: {:.4} km/s", accumulator.len() + 1, speed);
                accumulator.push(*speed);
            }
            Err(e) => warn!("skipping image pair: {}", e),
        }
        result
    }
}
