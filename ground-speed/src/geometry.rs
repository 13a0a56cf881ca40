//! Small numeric helpers shared by the displacement estimators.

use nalgebra::Point2;

/// Planar Euclidean distance between two pixel positions.
pub fn distance(a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    nalgebra::distance(a, b)
}

/// Arithmetic mean of a sequence of values.
///
/// Returns `None` for an empty sequence instead of dividing by zero.
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
