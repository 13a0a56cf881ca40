use crate::{Error, Result};

/// Centimetres in a kilometre.
pub const CM_PER_KM: f64 = 100_000.0;

/// Converts a pixel displacement observed over `elapsed_seconds` into a
/// ground speed in km/s.
///
/// `ground_sample_distance` is the ground distance covered by one pixel, in
/// centimetres.
///
/// ```
/// let speed = ground_speed::speed_km_per_sec(10.0, 12648.0, 4.0).unwrap();
/// assert!((speed - 0.3162).abs() < 1e-12);
/// ```
pub fn speed_km_per_sec(
    displacement: f64,
    ground_sample_distance: f64,
    elapsed_seconds: f64,
) -> Result<f64> {
    if !(elapsed_seconds > 0.0) {
        return Err(Error::InvalidElapsedTime(elapsed_seconds));
    }
    if !(ground_sample_distance.is_finite() && ground_sample_distance > 0.0) {
        return Err(Error::InvalidGroundSampleDistance(ground_sample_distance));
    }
    if !(displacement.is_finite() && displacement >= 0.0) {
        return Err(Error::InvalidDisplacement(displacement));
    }
    let distance_km = displacement * ground_sample_distance / CM_PER_KM;
    Ok(distance_km / elapsed_seconds)
}
