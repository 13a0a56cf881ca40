use crate::geometry;
use crate::{Correspondence, Error, Keypoint, Result};
use derive_more::Constructor;
use float_ord::FloatOrd;
use nalgebra::Point2;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The pixel positions of both ends of one correspondence.
#[derive(Debug, Clone, Copy, PartialEq, Constructor)]
pub struct CoordinatePair {
    pub a: Point2<f64>,
    pub b: Point2<f64>,
}

impl CoordinatePair {
    /// How far the feature moved between the two images, in pixels.
    pub fn distance(&self) -> f64 {
        geometry::distance(&self.a, &self.b)
    }
}

/// Resolves every correspondence to the pixel positions it refers to.
pub fn coordinate_pairs(
    correspondences: &[Correspondence],
    keypoints_a: &[Keypoint],
    keypoints_b: &[Keypoint],
) -> Result<Vec<CoordinatePair>> {
    let lookup = |keypoints: &[Keypoint], index: usize, image: char| {
        keypoints
            .get(index)
            .map(|keypoint| keypoint.point)
            .ok_or(Error::CorrespondenceOutOfRange {
                image,
                index,
                len: keypoints.len(),
            })
    };
    correspondences
        .iter()
        .map(|correspondence| {
            Ok(CoordinatePair::new(
                lookup(keypoints_a, correspondence.index_a, 'A')?,
                lookup(keypoints_b, correspondence.index_b, 'B')?,
            ))
        })
        .collect()
}

/// Reduces the per-feature motion of an image pair to one displacement.
pub trait DisplacementEstimator {
    /// Fails with [`Error::EmptyCorrespondenceSet`] when `pairs` is empty.
    fn estimate(&self, pairs: &[CoordinatePair]) -> Result<f64>;
}

impl<T> DisplacementEstimator for &T
where
    T: DisplacementEstimator + ?Sized,
{
    fn estimate(&self, pairs: &[CoordinatePair]) -> Result<f64> {
        (**self).estimate(pairs)
    }
}

/// The unweighted mean of all pair distances.
///
/// Mismatched features and features that moved on their own pull the mean
/// with them; no outlier rejection happens here.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanDisplacement;

impl DisplacementEstimator for MeanDisplacement {
    fn estimate(&self, pairs: &[CoordinatePair]) -> Result<f64> {
        geometry::mean(pairs.iter().map(CoordinatePair::distance))
            .ok_or(Error::EmptyCorrespondenceSet)
    }
}

/// Mean of the distances left after dropping the largest `trim_fraction`
/// of them.
///
/// At least one distance is always kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimmedMeanDisplacement {
    trim_fraction: f64,
}

impl TrimmedMeanDisplacement {
    /// `trim_fraction` is clamped to `[0, 1)`; NaN is treated as zero.
    pub fn new(trim_fraction: f64) -> Self {
        let trim_fraction = if trim_fraction.is_nan() {
            0.0
        } else {
            trim_fraction.clamp(0.0, 1.0 - f64::EPSILON)
        };
        Self { trim_fraction }
    }

    pub fn trim_fraction(&self) -> f64 {
        self.trim_fraction
    }
}

impl DisplacementEstimator for TrimmedMeanDisplacement {
    fn estimate(&self, pairs: &[CoordinatePair]) -> Result<f64> {
        if pairs.is_empty() {
            return Err(Error::EmptyCorrespondenceSet);
        }
        let mut distances: Vec<f64> = pairs.iter().map(CoordinatePair::distance).collect();
        distances.sort_by_key(|&distance| FloatOrd(distance));
        let dropped = (distances.len() as f64 * self.trim_fraction).floor() as usize;
        let kept = (distances.len() - dropped).max(1);
        geometry::mean(distances[..kept].iter().copied()).ok_or(Error::EmptyCorrespondenceSet)
    }
}

/// Selects the displacement estimator from configuration.
#[cfg_attr(
    feature = "serde-serialize",
    derive(Serialize, Deserialize),
    serde(tag = "method", rename_all = "snake_case")
)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplacementMethod {
    Mean,
    TrimmedMean { trim_fraction: f64 },
}

impl Default for DisplacementMethod {
    fn default() -> Self {
        Self::Mean
    }
}

impl DisplacementEstimator for DisplacementMethod {
    fn estimate(&self, pairs: &[CoordinatePair]) -> Result<f64> {
        match *self {
            Self::Mean => MeanDisplacement.estimate(pairs),
            Self::TrimmedMean { trim_fraction } => {
                TrimmedMeanDisplacement::new(trim_fraction).estimate(pairs)
            }
        }
    }
}

/// Mean pixel displacement of all correspondences of one image pair.
pub fn estimate_displacement(
    correspondences: &[Correspondence],
    keypoints_a: &[Keypoint],
    keypoints_b: &[Keypoint],
) -> Result<f64> {
    MeanDisplacement.estimate(&coordinate_pairs(
        correspondences,
        keypoints_a,
        keypoints_b,
    )?)
}
