use derive_more::{Deref, DerefMut};
use image::{GrayImage, ImageBuffer, Luma};
use ndarray::{azip, s, Array2, ArrayView2, ArrayViewMut2};
use std::f32;
use std::iter::repeat;
use wide::f32x4;

pub type GrayImageBuffer = ImageBuffer<Luma<f32>, Vec<f32>>;

/// A single channel `f32` image with values in `[0, 1]` for input images.
///
/// The scale space filters work directly on the contiguous buffer and on
/// `ndarray` views of it (rows first), which is considerably faster than the
/// generic pixel accessors.
#[derive(Debug, Clone, Deref, DerefMut)]
pub struct GrayFloatImage(pub GrayImageBuffer);

impl GrayFloatImage {
    pub fn from_luma8(image: &GrayImage) -> Self {
        Self(ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
            Luma([f32::from(image[(x, y)][0]) / 255.0])
        }))
    }

    pub fn from_array2(arr: Array2<f32>) -> Self {
        let (height, width) = arr.dim();
        let raw = arr.as_standard_layout().into_owned().into_raw_vec();
        Self(
            ImageBuffer::from_raw(width as u32, height as u32, raw)
                .expect("array has exactly width * height elements"),
        )
    }

    pub fn ref_array2(&self) -> ArrayView2<f32> {
        ArrayView2::from_shape((self.height(), self.width()), self.0.as_raw())
            .expect("image buffer holds width * height pixels")
    }

    pub fn mut_array2(&mut self) -> ArrayViewMut2<f32> {
        let shape = (self.height(), self.width());
        ArrayViewMut2::from_shape(shape, &mut self.0).expect("image buffer holds width * height pixels")
    }

    pub fn zero_array(&self) -> Array2<f32> {
        Array2::zeros((self.height(), self.width()))
    }

    pub fn width(&self) -> usize {
        self.0.width() as usize
    }

    pub fn height(&self) -> usize {
        self.0.height() as usize
    }

    pub fn new(width: usize, height: usize) -> Self {
        Self(ImageBuffer::from_pixel(width as u32, height as u32, Luma([0.0])))
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.get_pixel(x as u32, y as u32)[0]
    }

    /// Downsamples by averaging 2×2 tiles. An odd last row or column is
    /// dropped.
    pub fn half_size(&self) -> Self {
        let width = self.width() / 2;
        let height = self.height() / 2;
        let mut half = Array2::zeros((height, width));
        azip!((
            out in &mut half,
            window in self.ref_array2().slice(s![..height * 2, ..width * 2]).exact_chunks((2, 2)),
        ) {
            *out = window.sum() * 0.25;
        });
        Self::from_array2(half)
    }
}

/// An odd-length convolution kernel split into SIMD lanes, zero padded.
struct SimdKernel {
    lanes: Vec<f32x4>,
    half: usize,
}

impl SimdKernel {
    fn new(kernel: &[f32]) -> Self {
        debug_assert!(kernel.len() % 2 == 1);
        let lanes = kernel
            .chunks(4)
            .map(|chunk| {
                let mut data = [0.0; 4];
                data[..chunk.len()].copy_from_slice(chunk);
                f32x4::new(data)
            })
            .collect();
        Self {
            lanes,
            half: kernel.len() / 2,
        }
    }

    fn window(&self) -> usize {
        self.lanes.len() * 4
    }

    /// Convolves `line` with its edge values replicated outward and writes one
    /// value per element of `line` into `output`.
    fn apply<'a>(&self, line: &[f32], scratch: &mut Vec<f32>, output: impl Iterator<Item = &'a mut f32>) {
        let (Some(&first), Some(&last)) = (line.first(), line.last()) else {
            return;
        };
        scratch.clear();
        scratch.extend(repeat(first).take(self.half));
        scratch.extend_from_slice(line);
        scratch.extend(repeat(last).take(self.half));
        // Zeros under the padded lanes of the last window.
        scratch.resize(line.len() - 1 + self.window(), 0.0);
        scratch
            .windows(self.window())
            .zip(output)
            .for_each(|(window, out)| {
                *out = window
                    .chunks_exact(4)
                    .zip(&self.lanes)
                    .fold(f32x4::splat(0.0), |acc, (chunk, &lane)| {
                        f32x4::new([chunk[0], chunk[1], chunk[2], chunk[3]]).mul_add(lane, acc)
                    })
                    .reduce_add();
            });
    }
}

pub fn horizontal_filter(image: &GrayImageBuffer, kernel: &[f32]) -> GrayImageBuffer {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let kernel = SimdKernel::new(kernel);
    let mut output = vec![0.0; width * height];
    let mut scratch = Vec::with_capacity(width + kernel.window());
    if width > 0 {
        for (row_in, row_out) in image.as_raw().chunks_exact(width).zip(output.chunks_exact_mut(width)) {
            kernel.apply(row_in, &mut scratch, row_out.iter_mut());
        }
    }
    GrayImageBuffer::from_raw(width as u32, height as u32, output)
        .expect("output has exactly width * height pixels")
}

pub fn vertical_filter(image: &GrayImageBuffer, kernel: &[f32]) -> GrayImageBuffer {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let kernel = SimdKernel::new(kernel);
    let raw = image.as_raw();
    let mut output = vec![0.0; width * height];
    let mut column = vec![0.0; height];
    let mut scratch = Vec::with_capacity(height + kernel.window());
    for x in 0..width {
        for (y, value) in column.iter_mut().enumerate() {
            *value = raw[y * width + x];
        }
        kernel.apply(&column, &mut scratch, output[x..].iter_mut().step_by(width));
    }
    GrayImageBuffer::from_raw(width as u32, height as u32, output)
        .expect("output has exactly width * height pixels")
}

pub fn separable_filter(image: &GrayImageBuffer, h_kernel: &[f32], v_kernel: &[f32]) -> GrayImageBuffer {
    vertical_filter(&horizontal_filter(image, h_kernel), v_kernel)
}

fn gaussian(x: f32, sigma: f32) -> f32 {
    ((2.0 * f32::consts::PI).sqrt() * sigma).recip() * (-x.powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// A normalized Gaussian kernel of odd length `kernel_size`.
pub fn gaussian_kernel(sigma: f32, kernel_size: usize) -> Vec<f32> {
    assert!(kernel_size % 2 == 1, "kernel_size must be odd");
    let half_width = (kernel_size / 2) as i32;
    let mut kernel: Vec<f32> = (-half_width..=half_width)
        .map(|i| gaussian(i as f32, sigma))
        .collect();
    let sum: f32 = kernel.iter().sum();
    for value in kernel.iter_mut() {
        *value /= sum;
    }
    kernel
}

/// Gaussian blur with a kernel radius of `ceil(2 * sigma)`.
pub fn gaussian_blur(image: &GrayFloatImage, sigma: f32) -> GrayFloatImage {
    assert!(sigma > 0.0, "sigma must be > 0.0");
    let kernel_radius = (2.0 * sigma).ceil() as usize;
    let kernel = gaussian_kernel(sigma, kernel_radius * 2 + 1);
    GrayFloatImage(separable_filter(image, &kernel, &kernel))
}
