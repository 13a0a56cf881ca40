use ground_speed::format_speed;
use log::*;
use std::path::Path;

/// Writes the mean speed, with four decimal places, as the entire file content.
pub fn write_result(path: impl AsRef<Path>, mean_speed: f64) -> std::io::Result<()> {
    let path = path.as_ref();
    std::fs::write(path, format_speed(mean_speed))?;
    info!("wrote {} km/s to {}", format_speed(mean_speed), path.display());
    Ok(())
}
