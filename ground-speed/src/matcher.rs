use akaze::Akaze;
use bitarray::Hamming;
use core::cmp::Reverse;
use core::num::NonZeroUsize;
use derive_more::Constructor;
use float_ord::FloatOrd;
use image::GrayImage;
use log::*;
use nalgebra::Point2;
use space::{Knn, LinearKnn};

pub use akaze::Descriptor;

/// A detected feature in one image.
#[derive(Debug, Clone, Copy)]
pub struct Keypoint {
    /// Position in pixel coordinates, +x right and +y down from the top-left corner.
    pub point: Point2<f64>,
    /// The magnitude of response from the detector.
    pub response: f32,
    pub descriptor: Descriptor,
}

/// A match between keypoint `index_a` of the first image and keypoint
/// `index_b` of the second.
///
/// `distance` is the Hamming distance between the two descriptors, so lower
/// is better. It is only meaningful together with the keypoint lists of the
/// pair that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Constructor)]
pub struct Correspondence {
    pub index_a: usize,
    pub index_b: usize,
    pub distance: u32,
}

/// Everything the matcher produced for one image pair.
#[derive(Debug, Clone, Default)]
pub struct FeatureMatches {
    /// Sorted ascending by `distance`.
    pub correspondences: Vec<Correspondence>,
    pub keypoints_a: Vec<Keypoint>,
    pub keypoints_b: Vec<Keypoint>,
}

impl FeatureMatches {
    pub fn is_empty(&self) -> bool {
        self.correspondences.is_empty()
    }

    /// Keeps only the `count` most confident correspondences.
    pub fn truncate(&mut self, count: usize) {
        self.correspondences.truncate(count);
    }
}

/// Finds corresponding landmarks between two grayscale images.
pub trait FeatureMatcher {
    fn match_features(&self, image_a: &GrayImage, image_b: &GrayImage) -> FeatureMatches;
}

impl<T> FeatureMatcher for &T
where
    T: FeatureMatcher + ?Sized,
{
    fn match_features(&self, image_a: &GrayImage, image_b: &GrayImage) -> FeatureMatches {
        (**self).match_features(image_a, image_b)
    }
}

/// AKAZE detection followed by cross-checked brute-force Hamming matching.
#[derive(Debug, Clone, Copy)]
pub struct AkazeMatcher {
    akaze: Akaze,
    max_features: NonZeroUsize,
}

impl AkazeMatcher {
    /// `threshold` is the AKAZE detector response threshold (`0.001` is the
    /// AKAZE default, smaller values detect more features).
    pub fn new(threshold: f64, max_features: NonZeroUsize) -> Self {
        Self::with_detector(Akaze::new(threshold), max_features)
    }

    pub fn with_detector(akaze: Akaze, max_features: NonZeroUsize) -> Self {
        Self {
            akaze,
            max_features,
        }
    }

    pub fn max_features(&self) -> NonZeroUsize {
        self.max_features
    }

    /// Detects up to `max_features` keypoints, strongest response first.
    ///
    /// Keypoints with equal response keep the detector's order.
    pub fn detect(&self, image: &GrayImage) -> Vec<Keypoint> {
        let (keypoints, descriptors) = self.akaze.extract(image);
        trace!("AKAZE returned {} keypoints", keypoints.len());
        let mut features: Vec<Keypoint> = keypoints
            .iter()
            .zip(descriptors)
            .map(|(keypoint, descriptor)| Keypoint {
                point: Point2::new(keypoint.point.0 as f64, keypoint.point.1 as f64),
                response: keypoint.response,
                descriptor,
            })
            .collect();
        features.sort_by_key(|feature| Reverse(FloatOrd(feature.response)));
        features.truncate(self.max_features.get());
        features
    }
}

impl FeatureMatcher for AkazeMatcher {
    fn match_features(&self, image_a: &GrayImage, image_b: &GrayImage) -> FeatureMatches {
        let keypoints_a = self.detect(image_a);
        let keypoints_b = self.detect(image_b);
        let descriptors_a: Vec<Descriptor> = keypoints_a.iter().map(|kp| kp.descriptor).collect();
        let descriptors_b: Vec<Descriptor> = keypoints_b.iter().map(|kp| kp.descriptor).collect();
        let correspondences = symmetric_matching(&descriptors_a, &descriptors_b);
        debug!(
            "matched {} of {} and {} keypoints",
            correspondences.len(),
            keypoints_a.len(),
            keypoints_b.len()
        );
        FeatureMatches {
            correspondences,
            keypoints_a,
            keypoints_b,
        }
    }
}

/// The nearest descriptor in `b` for every descriptor in `a`, with its
/// Hamming distance. `LinearKnn::nn` keeps the first of equally near
/// candidates, so ties go to the lowest index in `b`.
fn best_matches(a: &[Descriptor], b: &[Descriptor]) -> Vec<Option<(usize, u32)>> {
    let knn_b = LinearKnn {
        metric: Hamming,
        iter: b.iter(),
    };
    a.iter()
        .map(|query| {
            knn_b
                .nn(query)
                .map(|neighbor| (neighbor.index, neighbor.distance))
        })
        .collect()
}

/// Cross-checked matching between two descriptor sets.
///
/// A pair `(i, j)` is kept only when `b[j]` is the best match for `a[i]` and
/// `a[i]` is also the best match for `b[j]`. Consider three features on a
/// line, `X---Y-Z`: the best match of `X` is `Y`, but the best match of `Y`
/// is `Z`, so only `Y` and `Z` form a match and `X` is dropped rather than
/// guessed.
///
/// The result is sorted ascending by distance. Equal distances stay in
/// ascending order of the index in `a`.
pub fn symmetric_matching(a: &[Descriptor], b: &[Descriptor]) -> Vec<Correspondence> {
    let forward = best_matches(a, b);
    let reverse = best_matches(b, a);
    let mut correspondences: Vec<Correspondence> = forward
        .into_iter()
        .enumerate()
        .filter_map(|(index_a, best)| {
            let (index_b, distance) = best?;
            let reciprocated = reverse[index_b].map(|(index, _)| index) == Some(index_a);
            reciprocated.then(|| Correspondence::new(index_a, index_b, distance))
        })
        .collect();
    correspondences.sort_by_key(|correspondence| correspondence.distance);
    correspondences
}
