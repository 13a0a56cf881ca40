use crate::{AkazeMatcher, DisplacementMethod, Pipeline};
use core::num::NonZeroUsize;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The settings for estimating speed from image pairs.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Settings {
    /// The maximum number of keypoints kept per image
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_max_features"))]
    pub max_features: NonZeroUsize,
    /// The threshold used for akaze
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_akaze_threshold")
    )]
    pub akaze_threshold: f64,
    /// Ground distance covered by one pixel, in centimetres
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_ground_sample_distance")
    )]
    pub ground_sample_distance: f64,
    /// Only the best this many matches are used; all of them when unset
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub max_matches: Option<NonZeroUsize>,
    /// How the per-feature distances are reduced to one displacement
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub displacement: DisplacementMethod,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_features: default_max_features(),
            akaze_threshold: default_akaze_threshold(),
            ground_sample_distance: default_ground_sample_distance(),
            max_matches: None,
            displacement: DisplacementMethod::default(),
        }
    }
}

impl Settings {
    /// Builds the AKAZE-backed pipeline these settings describe.
    pub fn pipeline(&self) -> Pipeline<AkazeMatcher, DisplacementMethod> {
        let pipeline = Pipeline::new(
            AkazeMatcher::new(self.akaze_threshold, self.max_features),
            self.displacement,
            self.ground_sample_distance,
        );
        match self.max_matches {
            Some(count) => pipeline.max_matches(count),
            None => pipeline,
        }
    }
}

fn default_max_features() -> NonZeroUsize {
    NonZeroUsize::new(1000).unwrap_or(NonZeroUsize::MIN)
}

fn default_akaze_threshold() -> f64 {
    0.001
}

fn default_ground_sample_distance() -> f64 {
    12648.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.max_features.get(), 1000);
        assert_eq!(settings.ground_sample_distance, 12648.0);
        assert_eq!(settings.max_matches, None);
        assert_eq!(settings.displacement, DisplacementMethod::Mean);
    }

    #[test]
    fn pipeline_carries_settings() {
        let settings = Settings {
            max_features: NonZeroUsize::new(250).unwrap(),
            ground_sample_distance: 5000.0,
            max_matches: NonZeroUsize::new(20),
            ..Default::default()
        };
        let pipeline = settings.pipeline();
        assert_eq!(pipeline.matcher().max_features().get(), 250);
        assert_eq!(pipeline.ground_sample_distance(), 5000.0);
        assert_eq!(pipeline.match_limit(), NonZeroUsize::new(20));
    }
}
