use crate::image::{separable_filter, GrayFloatImage};

/// Difference between the center and side weights of the Scharr smoothing axis.
const SCHARR_CENTER: f64 = 10.0 / 3.0;

/// 3×3 Scharr derivative along x (`cv::Scharr` with xorder 1, unscaled).
pub fn simple_scharr_horizontal(image: &GrayFloatImage) -> GrayFloatImage {
    GrayFloatImage(separable_filter(image, &[-1., 0., 1.], &[3., 10., 3.]))
}

/// 3×3 Scharr derivative along y (`cv::Scharr` with yorder 1, unscaled).
pub fn simple_scharr_vertical(image: &GrayFloatImage) -> GrayFloatImage {
    GrayFloatImage(separable_filter(image, &[3., 10., 3.], &[-1., 0., 1.]))
}

/// Scharr derivative along x at scale `sigma_size`.
pub fn scharr_horizontal(image: &GrayFloatImage, sigma_size: u32) -> GrayFloatImage {
    if sigma_size == 1 {
        return simple_scharr_horizontal(image);
    }
    GrayFloatImage(separable_filter(
        image,
        &difference_kernel(sigma_size),
        &smoothing_kernel(sigma_size),
    ))
}

/// Scharr derivative along y at scale `sigma_size`.
pub fn scharr_vertical(image: &GrayFloatImage, sigma_size: u32) -> GrayFloatImage {
    if sigma_size == 1 {
        return simple_scharr_vertical(image);
    }
    GrayFloatImage(separable_filter(
        image,
        &smoothing_kernel(sigma_size),
        &difference_kernel(sigma_size),
    ))
}

fn kernel_size(sigma_size: u32) -> usize {
    (3 + 2 * (sigma_size - 1)) as usize
}

fn difference_kernel(sigma_size: u32) -> Vec<f32> {
    let size = kernel_size(sigma_size);
    let mut kernel = vec![0.0; size];
    kernel[0] = -1.0;
    kernel[size - 1] = 1.0;
    kernel
}

fn smoothing_kernel(sigma_size: u32) -> Vec<f32> {
    let size = kernel_size(sigma_size);
    let side = (1.0 / (2.0 * f64::from(sigma_size) * (SCHARR_CENTER + 2.0))) as f32;
    let mut kernel = vec![0.0; size];
    kernel[0] = side;
    kernel[size / 2] = side * SCHARR_CENTER as f32;
    kernel[size - 1] = side;
    kernel
}
