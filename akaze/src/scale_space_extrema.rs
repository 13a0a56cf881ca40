use crate::evolution::EvolutionStep;
use crate::{Akaze, KeyPoint};
use log::*;
use std::f32::consts::{PI, TAU};

/// Descriptor and orientation samples reach at most this many `sigma_size`
/// units away from a keypoint.
const SAMPLE_REACH: f32 = 10.0 * std::f32::consts::SQRT_2;
/// Width of the sliding window used for the dominant orientation.
const ORIENTATION_WINDOW: f32 = PI / 3.0;
const ORIENTATION_STEP: f32 = 0.15;

fn squared_distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)
}

/// Full resolution coordinate of pixel `v` in an octave downsampled by `ratio`.
fn to_full_resolution(v: f32, ratio: f32) -> f32 {
    v * ratio + 0.5 * (ratio - 1.0)
}

impl Akaze {
    /// Local maxima of the detector response above the threshold, with
    /// repeated detections across neighbouring levels collapsed to the
    /// strongest one.
    fn find_scale_space_extrema(&self, evolutions: &[EvolutionStep]) -> Vec<KeyPoint> {
        let threshold = self.detector_threshold as f32;
        let mut candidates: Vec<KeyPoint> = vec![];
        for (class_id, evolution) in evolutions.iter().enumerate() {
            let det = &evolution.Ldet;
            let (width, height) = (det.width(), det.height());
            let ratio = 2.0f32.powi(evolution.octave as i32);
            let size = (evolution.esigma * self.derivative_factor) as f32;
            let reach = SAMPLE_REACH * f32::round(size / ratio);
            for y in 1..height.saturating_sub(1) {
                for x in 1..width.saturating_sub(1) {
                    let value = det.get(x, y);
                    let is_maximum = value > threshold
                        && value > det.get(x - 1, y)
                        && value > det.get(x + 1, y)
                        && value > det.get(x, y - 1)
                        && value > det.get(x, y + 1);
                    if !is_maximum {
                        continue;
                    }
                    let (xf, yf) = (x as f32, y as f32);
                    let is_out = f32::round(xf - reach) - 1.0 < 0.0
                        || f32::round(xf + reach) + 1.0 >= width as f32
                        || f32::round(yf - reach) - 1.0 < 0.0
                        || f32::round(yf + reach) + 1.0 >= height as f32;
                    if is_out {
                        continue;
                    }
                    let keypoint = KeyPoint {
                        point: (to_full_resolution(xf, ratio), to_full_resolution(yf, ratio)),
                        response: value.abs(),
                        size,
                        octave: evolution.octave as usize,
                        class_id,
                        angle: 0.0,
                    };
                    // Compare with the same and the previous level.
                    let repeated = candidates.iter().position(|previous| {
                        (previous.class_id == class_id || previous.class_id + 1 == class_id)
                            && squared_distance(previous.point, keypoint.point) <= size * size
                    });
                    match repeated {
                        None => candidates.push(keypoint),
                        Some(index) if keypoint.response > candidates[index].response => {
                            candidates[index] = keypoint
                        }
                        Some(_) => {}
                    }
                }
            }
        }
        // Drop candidates outshone by a neighbour on the next level.
        let keypoints: Vec<KeyPoint> = candidates
            .iter()
            .enumerate()
            .filter(|&(i, keypoint)| {
                !candidates[i + 1..].iter().any(|upper| {
                    upper.class_id == keypoint.class_id + 1
                        && squared_distance(upper.point, keypoint.point) <= keypoint.size * keypoint.size
                        && keypoint.response < upper.response
                })
            })
            .map(|(_, &keypoint)| keypoint)
            .collect();
        trace!("{} scale space extrema", keypoints.len());
        keypoints
    }

    /// Detects keypoints in a scale space whose detector response has been
    /// computed, refines them to sub-pixel accuracy and assigns their
    /// orientation.
    pub fn detect_keypoints(&self, evolutions: &[EvolutionStep]) -> Vec<KeyPoint> {
        let extrema = self.find_scale_space_extrema(evolutions);
        let mut keypoints = do_subpixel_refinement(&extrema, evolutions);
        for keypoint in keypoints.iter_mut() {
            compute_main_orientation(keypoint, evolutions);
        }
        keypoints
    }
}

/// Weight of the orientation sample at offset `(i, j)`: a Gaussian with
/// sigma 2.5.
fn orientation_weight(i: i32, j: i32) -> f32 {
    const SIGMA_SQUARED: f32 = 2.5 * 2.5;
    (-((i * i + j * j) as f32) / (2.0 * SIGMA_SQUARED)).exp() / (2.0 * PI * SIGMA_SQUARED)
}

/// The angle of `(x, y)` in `[0, 2π)`.
fn angle(x: f32, y: f32) -> f32 {
    let angle = y.atan2(x);
    if angle < 0.0 {
        angle + TAU
    } else {
        angle
    }
}

/// Whether `ang` lies strictly inside the window from `start` to `end`,
/// which may wrap around zero.
fn in_window(start: f32, end: f32, ang: f32) -> bool {
    if start < end {
        start < ang && ang < end
    } else {
        (ang > 0.0 && ang < end) || (ang > start && ang < TAU)
    }
}

/// Sets the angle of `keypoint` to the direction of the largest sum of
/// weighted gradients within any π/3 window.
fn compute_main_orientation(keypoint: &mut KeyPoint, evolutions: &[EvolutionStep]) {
    let evolution = &evolutions[keypoint.class_id];
    let ratio = (1u32 << evolution.octave) as f32;
    let scale = f32::round(0.5 * keypoint.size / ratio);
    let xf = keypoint.point.0 / ratio;
    let yf = keypoint.point.1 / ratio;
    // Gradient responses within a radius of 6 * scale.
    let samples: Vec<(f32, f32, f32)> = (-6i32..=6)
        .flat_map(|i| (-6i32..=6).map(move |j| (i, j)))
        .filter(|&(i, j)| i * i + j * j < 36)
        .map(|(i, j)| {
            let ix = f32::round(xf + i as f32 * scale) as usize;
            let iy = f32::round(yf + j as f32 * scale) as usize;
            let weight = orientation_weight(i, j);
            let rx = weight * evolution.Lx.get(ix, iy);
            let ry = weight * evolution.Ly.get(ix, iy);
            (rx, ry, angle(rx, ry))
        })
        .collect();

    let mut strongest = 0.0;
    let mut start = 0.0f32;
    while start < TAU {
        let end = if start + ORIENTATION_WINDOW > TAU {
            start - (TAU - ORIENTATION_WINDOW)
        } else {
            start + ORIENTATION_WINDOW
        };
        let (sum_x, sum_y) = samples
            .iter()
            .filter(|&&(_, _, ang)| in_window(start, end, ang))
            .fold((0.0, 0.0), |(sx, sy), &(rx, ry, _)| (sx + rx, sy + ry));
        let magnitude = sum_x * sum_x + sum_y * sum_y;
        if magnitude > strongest {
            strongest = magnitude;
            keypoint.angle = angle(sum_x, sum_y);
        }
        start += ORIENTATION_STEP;
    }
}

/// Fits a quadratic to the detector response around each keypoint and moves
/// the keypoint to its peak. Keypoints whose peak lies more than a pixel
/// away are dropped.
fn do_subpixel_refinement(keypoints: &[KeyPoint], evolutions: &[EvolutionStep]) -> Vec<KeyPoint> {
    let refined: Vec<KeyPoint> = keypoints
        .iter()
        .filter_map(|keypoint| {
            let det = &evolutions[keypoint.class_id].Ldet;
            let ratio = 2.0f32.powi(keypoint.octave as i32);
            let x = f32::round(keypoint.point.0 / ratio) as usize;
            let y = f32::round(keypoint.point.1 / ratio) as usize;
            let center = det.get(x, y);
            let d_x = 0.5 * (det.get(x + 1, y) - det.get(x - 1, y));
            let d_y = 0.5 * (det.get(x, y + 1) - det.get(x, y - 1));
            let d_xx = det.get(x + 1, y) + det.get(x - 1, y) - 2.0 * center;
            let d_yy = det.get(x, y + 1) + det.get(x, y - 1) - 2.0 * center;
            let d_xy = 0.25 * (det.get(x + 1, y + 1) + det.get(x - 1, y - 1))
                - 0.25 * (det.get(x + 1, y - 1) + det.get(x - 1, y + 1));
            #[allow(clippy::suspicious_operation_groupings)]
            let inv_det = (d_xx * d_yy - d_xy * d_xy).recip();
            let offset_x = -inv_det * (d_yy * d_x - d_xy * d_y);
            let offset_y = -inv_det * (d_xx * d_y - d_xy * d_x);
            // NaN offsets from a singular Hessian fail the comparison as well.
            if !(offset_x.abs() <= 1.0 && offset_y.abs() <= 1.0) {
                return None;
            }
            Some(KeyPoint {
                point: (
                    to_full_resolution(x as f32 + offset_x, ratio),
                    to_full_resolution(y as f32 + offset_y, ratio),
                ),
                ..*keypoint
            })
        })
        .collect();
    trace!(
        "{}/{} remain after subpixel refinement",
        refined.len(),
        keypoints.len()
    );
    refined
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn orientation_weights_match_the_sigma_2_5_table() {
        assert_relative_eq!(orientation_weight(0, 0), 0.0254_6481, epsilon = 1e-7);
        assert_relative_eq!(orientation_weight(1, 0), 0.0235_0698, epsilon = 1e-7);
        assert_relative_eq!(orientation_weight(3, -2), 0.0090_0066, epsilon = 1e-7);
        assert_relative_eq!(orientation_weight(6, 6), 0.0000_8024, epsilon = 1e-7);
    }

    #[test]
    fn angles_are_in_zero_to_tau() {
        assert_relative_eq!(angle(1.0, 0.0), 0.0);
        assert_relative_eq!(angle(0.0, 1.0), PI / 2.0, epsilon = 1e-6);
        assert_relative_eq!(angle(0.0, -1.0), 1.5 * PI, epsilon = 1e-6);
    }

    #[test]
    fn windows_wrap_around_zero() {
        assert!(in_window(0.5, 1.5, 1.0));
        assert!(!in_window(0.5, 1.5, 2.0));
        // From 6.0 past 2π to 0.5.
        assert!(in_window(6.0, 0.5, 0.2));
        assert!(in_window(6.0, 0.5, 6.1));
        assert!(!in_window(6.0, 0.5, 3.0));
    }
}
