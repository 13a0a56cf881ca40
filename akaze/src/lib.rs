//! AKAZE keypoints and MLDB descriptors.
//!
//! [`Akaze::extract`] runs the whole detector on a grayscale image and
//! returns keypoints together with their descriptors. The individual stages
//! (scale space construction, detector response, extrema, descriptors) are
//! methods on [`Akaze`] as well.

mod contrast_factor;
mod derivatives;
mod descriptors;
mod detector_response;
mod evolution;
mod fed_tau;
mod image;
mod nonlinear_diffusion;
mod scale_space_extrema;

use crate::image::{gaussian_blur, GrayFloatImage};
use ::image::GrayImage;
use bitarray::BitArray;
use log::*;
use nonlinear_diffusion::pm_g2;

pub use evolution::EvolutionStep;

/// The 486-bit MLDB descriptor, padded to 512 bits.
pub type Descriptor = BitArray<64>;

/// A point of interest in an image, following OpenCV conventions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPoint {
    /// Pixel coordinates, +x to the right and +y down from the top-left corner.
    pub point: (f32, f32),
    /// The magnitude of response from the detector.
    pub response: f32,
    /// The radius defining the extent of the keypoint, in pixel units.
    pub size: f32,
    /// The octave of the scale space in which the keypoint was detected.
    pub octave: usize,
    /// Index of the evolution the keypoint was detected in.
    pub class_id: usize,
    /// Dominant orientation in radians.
    pub angle: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("descriptor sample ({x}, {y}) falls outside the {width}x{height} evolution")]
    SampleOutOfBounds {
        x: isize,
        y: isize,
        width: usize,
        height: usize,
    },
}

/// AKAZE parameters.
///
/// `detector_threshold` is the one usually tuned. [`Akaze::new`] sets it and
/// leaves everything else at its default; [`Akaze::sparse`] and
/// [`Akaze::dense`] are shorthands. The default threshold is `0.001`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Akaze {
    /// Number of sublevels per octave.
    pub num_sublevels: u32,
    /// Maximum octave evolution of the image, 2^sigma (coarsest scale sigma units).
    pub max_octave_evolution: u32,
    /// Base scale offset (sigma units).
    pub base_scale_offset: f64,
    /// Percentile of the gradient histogram used for the contrast factor.
    pub contrast_percentile: f64,
    /// Number of bins in the contrast factor histogram.
    pub contrast_factor_num_bins: usize,
    /// Factor for the multiscale derivatives.
    pub derivative_factor: f64,
    /// Detector response threshold to accept a point.
    pub detector_threshold: f64,
    /// Number of channels in the descriptor (1, 2 or 3).
    pub descriptor_channels: usize,
    /// The sampled patch spans `2 * descriptor_pattern_size * scale` pixels.
    pub descriptor_pattern_size: usize,
}

impl Akaze {
    pub fn new(threshold: f64) -> Self {
        Self {
            detector_threshold: threshold,
            ..Default::default()
        }
    }

    /// Threshold `0.01`.
    pub fn sparse() -> Self {
        Self::new(0.01)
    }

    /// Threshold `0.0001`.
    pub fn dense() -> Self {
        Self::new(0.0001)
    }
}

impl Default for Akaze {
    fn default() -> Akaze {
        Akaze {
            num_sublevels: 4,
            max_octave_evolution: 4,
            base_scale_offset: 1.6,
            contrast_percentile: 0.7,
            contrast_factor_num_bins: 300,
            derivative_factor: 1.5,
            detector_threshold: 0.001,
            descriptor_channels: 3,
            descriptor_pattern_size: 10,
        }
    }
}

impl Akaze {
    /// Fills `evolutions` with the nonlinear scale space of `image`.
    fn create_nonlinear_scale_space(&self, evolutions: &mut [EvolutionStep], image: &GrayFloatImage) {
        let Some((first, _)) = evolutions.split_first_mut() else {
            return;
        };
        first.Lt = gaussian_blur(image, self.base_scale_offset as f32);
        first.Lsmooth = first.Lt.clone();
        let mut contrast_factor = contrast_factor::compute_contrast_factor(
            &first.Lsmooth,
            self.contrast_percentile,
            1.0,
            self.contrast_factor_num_bins,
        );
        debug!("initial contrast factor {}", contrast_factor);
        for i in 1..evolutions.len() {
            if evolutions[i].octave > evolutions[i - 1].octave {
                evolutions[i].Lt = evolutions[i - 1].Lt.half_size();
                contrast_factor *= 0.75;
                trace!(
                    "evolution {} at {}x{}, contrast factor {}",
                    i,
                    evolutions[i].Lt.width(),
                    evolutions[i].Lt.height(),
                    contrast_factor
                );
            } else {
                evolutions[i].Lt = evolutions[i - 1].Lt.clone();
            }
            let evolution = &mut evolutions[i];
            evolution.Lsmooth = gaussian_blur(&evolution.Lt, 1.0);
            evolution.Lx = derivatives::scharr_horizontal(&evolution.Lsmooth, 1);
            evolution.Ly = derivatives::scharr_vertical(&evolution.Lsmooth, 1);
            evolution.Lflow = pm_g2(&evolution.Lx, &evolution.Ly, contrast_factor);
            for step_size in evolution.fed_tau_steps.clone() {
                nonlinear_diffusion::calculate_step(evolution, step_size as f32);
            }
        }
    }

    /// Extracts keypoints and their descriptors from `image`.
    ///
    /// Both vectors have the same length and keypoint `i` is described by
    /// descriptor `i`. Keypoints too close to the border for a descriptor
    /// are dropped. Images whose smaller side is under 40 pixels yield no
    /// features.
    ///
    /// ```
    /// let image = image::GrayImage::from_fn(64, 64, |x, y| image::Luma([((x * y) % 251) as u8]));
    /// let (keypoints, descriptors) = akaze::Akaze::default().extract(&image);
    /// assert_eq!(keypoints.len(), descriptors.len());
    /// ```
    pub fn extract(&self, image: &GrayImage) -> (Vec<KeyPoint>, Vec<Descriptor>) {
        let mut evolutions = self.allocate_evolutions(image.width(), image.height());
        if evolutions.is_empty() {
            debug!(
                "{}x{} image is too small for a scale space",
                image.width(),
                image.height()
            );
            return (vec![], vec![]);
        }
        self.create_nonlinear_scale_space(&mut evolutions, &GrayFloatImage::from_luma8(image));
        self.detector_response(&mut evolutions);
        let keypoints = self.detect_keypoints(&evolutions);
        let (keypoints, descriptors) = self.extract_descriptors(&evolutions, &keypoints);
        debug!("extracted {} features", keypoints.len());
        (keypoints, descriptors)
    }
}
