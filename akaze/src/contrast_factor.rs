use crate::derivatives::{simple_scharr_horizontal, simple_scharr_vertical};
use crate::image::{gaussian_blur, GrayFloatImage};
use float_ord::FloatOrd;
use log::*;

/// Used when the image has no usable gradient histogram.
const FALLBACK_CONTRAST: f64 = 0.03;

/// An empirical contrast factor k for the Perona-Malik diffusivity: the
/// gradient magnitude at `percentile` (0 to 1) of the non-zero gradient
/// histogram of `image`, blurred at `gradient_histogram_scale`.
///
/// Flat images and images without interior pixels get a fixed fallback so
/// the diffusivity stays finite.
pub fn compute_contrast_factor(
    image: &GrayFloatImage,
    percentile: f64,
    gradient_histogram_scale: f64,
    num_bins: usize,
) -> f64 {
    let gaussian = gaussian_blur(image, gradient_histogram_scale as f32);
    let lx = simple_scharr_horizontal(&gaussian);
    let ly = simple_scharr_vertical(&gaussian);
    let magnitudes: Vec<f64> = (1..gaussian.height().saturating_sub(1))
        .flat_map(|y| (1..gaussian.width().saturating_sub(1)).map(move |x| (x, y)))
        .map(|(x, y)| (f64::from(lx.get(x, y)).powi(2) + f64::from(ly.get(x, y)).powi(2)).sqrt())
        .filter(|&magnitude| magnitude != 0.0)
        .collect();
    let hmax = match magnitudes.iter().copied().map(FloatOrd).max() {
        Some(FloatOrd(hmax)) if num_bins > 0 => hmax,
        _ => return FALLBACK_CONTRAST,
    };

    let mut histogram = vec![0usize; num_bins];
    for magnitude in &magnitudes {
        let bin = ((num_bins as f64) * (magnitude / hmax)) as usize;
        histogram[bin.min(num_bins - 1)] += 1;
    }
    let threshold = (magnitudes.len() as f64 * percentile) as usize;
    let mut k = 0;
    let mut num_elements = 0;
    while num_elements < threshold && k < num_bins {
        num_elements += histogram[k];
        k += 1;
    }
    trace!(
        "hmax {}, threshold {}, num_elements {}",
        hmax,
        threshold,
        num_elements
    );
    if num_elements >= threshold && k > 0 {
        hmax * (k as f64) / (num_bins as f64)
    } else {
        FALLBACK_CONTRAST
    }
}
