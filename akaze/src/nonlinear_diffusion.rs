use crate::{EvolutionStep, GrayFloatImage};
use ndarray::{azip, s, Array2};

/// One explicit diffusion step of `step_size` on `Lt`, using `Lflow` as the
/// conductivity.
///
/// Forward Euler on a 3×3 stencil:
/// dL/dt = d(c dL/dx)/dx + d(c dL/dy)/dy
#[allow(non_snake_case)]
pub fn calculate_step(evolution_step: &mut EvolutionStep, step_size: f32) {
    let mut input = evolution_step.Lt.mut_array2();
    let conductivities = evolution_step.Lflow.ref_array2();
    let (rows, columns) = input.dim();
    if rows < 2 || columns < 2 {
        return;
    }

    let mut horizontal_flow = Array2::<f32>::zeros((rows, columns - 1));
    azip!((
        flow in &mut horizontal_flow,
        &a in input.slice(s![.., ..-1]),
        &b in input.slice(s![.., 1..]),
        &ca in conductivities.slice(s![.., ..-1]),
        &cb in conductivities.slice(s![.., 1..]),
    ) {
        *flow = 0.5 * step_size * (ca + cb) * (b - a);
    });
    let mut vertical_flow = Array2::<f32>::zeros((rows - 1, columns));
    azip!((
        flow in &mut vertical_flow,
        &a in input.slice(s![..-1, ..]),
        &b in input.slice(s![1.., ..]),
        &ca in conductivities.slice(s![..-1, ..]),
        &cb in conductivities.slice(s![1.., ..]),
    ) {
        *flow = 0.5 * step_size * (ca + cb) * (b - a);
    });

    // Every flow leaves one pixel and enters its neighbour.
    input
        .slice_mut(s![.., ..-1])
        .zip_mut_with(&horizontal_flow, |acc, &flow| *acc += flow);
    input
        .slice_mut(s![.., 1..])
        .zip_mut_with(&horizontal_flow, |acc, &flow| *acc -= flow);
    input
        .slice_mut(s![..-1, ..])
        .zip_mut_with(&vertical_flow, |acc, &flow| *acc += flow);
    input
        .slice_mut(s![1.., ..])
        .zip_mut_with(&vertical_flow, |acc, &flow| *acc -= flow);
}

/// Perona-Malik conductivity g2 = 1 / (1 + |dL|^2 / k^2).
#[allow(non_snake_case)]
pub fn pm_g2(Lx: &GrayFloatImage, Ly: &GrayFloatImage, k: f64) -> GrayFloatImage {
    debug_assert_eq!(Lx.width(), Ly.width());
    debug_assert_eq!(Lx.height(), Ly.height());
    let inverse_k = (1.0 / (k * k)) as f32;
    let mut conductivities = Lx.zero_array();
    azip!((
        c in &mut conductivities,
        &x in Lx.ref_array2(),
        &y in Ly.ref_array2(),
    ) {
        *c = 1.0 / (1.0 + inverse_k * (x * x + y * y));
    });
    GrayFloatImage::from_array2(conductivities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Akaze;
    use approx::assert_relative_eq;
    use image::{ImageBuffer, Luma};

    #[test]
    fn diffusion_conserves_intensity() {
        let mut evolution = Akaze::default().allocate_evolutions(64, 64).remove(0);
        evolution.Lt = GrayFloatImage(ImageBuffer::from_fn(64, 64, |x, y| {
            Luma([if (x / 8 + y / 8) % 2 == 0 { 1.0 } else { 0.0 }])
        }));
        evolution.Lflow = GrayFloatImage(ImageBuffer::from_pixel(64, 64, Luma([1.0])));
        let before: f32 = evolution.Lt.iter().sum();
        let contrast_before = evolution.Lt.get(8, 0) - evolution.Lt.get(7, 0);
        calculate_step(&mut evolution, 0.2);
        let after: f32 = evolution.Lt.iter().sum();
        assert_relative_eq!(before, after, epsilon = 1e-2);
        assert!((evolution.Lt.get(8, 0) - evolution.Lt.get(7, 0)).abs() < contrast_before.abs());
    }

    #[test]
    fn flat_regions_conduct_fully() {
        let zero = GrayFloatImage::new(4, 4);
        let conductivity = pm_g2(&zero, &zero, 0.03);
        assert!(conductivity.iter().all(|&c| c == 1.0));
    }
}
