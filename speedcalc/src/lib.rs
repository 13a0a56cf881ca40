//! Replays a sequence of time-stamped surface photographs through the
//! [`ground_speed`] pipeline and reports the mean ground speed of the run.

mod error;
pub mod replay;
pub mod session;
pub mod sink;
pub mod timestamp;

pub use error::*;
pub use replay::{load_grayscale, FileReplay, Frame};
pub use session::run_session;
pub use sink::write_result;

use ground_speed::Settings;
use log::*;
use std::path::{Path, PathBuf};

/// Reads settings from a JSON file, or the defaults if there is no such file.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        info!("{} not found, using default settings", path.display());
        return Ok(Settings::default());
    }
    let reader = std::io::BufReader::new(std::fs::File::open(path)?);
    let settings = serde_json::from_reader(reader)?;
    info!("loaded settings from {}", path.display());
    Ok(settings)
}

/// The mean speed in km/s over all consecutive pairs of `images`.
pub fn estimate_run(
    settings: &Settings,
    images: impl IntoIterator<Item = PathBuf>,
) -> Result<f64> {
    let accumulator = run_session(&settings.pipeline(), FileReplay::new(images));
    Ok(accumulator.finalize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ground_speed::DisplacementMethod;

    #[test]
    fn missing_settings_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{
                "ground_sample_distance": 10000.0,
                "max_matches": 50,
                "displacement": { "method": "trimmed_mean", "trim_fraction": 0.1 }
            }"#,
        )
        .unwrap();
        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.ground_sample_distance, 10000.0);
        assert_eq!(settings.max_matches.map(|n| n.get()), Some(50));
        assert_eq!(
            settings.displacement,
            DisplacementMethod::TrimmedMean { trim_fraction: 0.1 }
        );
        assert_eq!(settings.max_features.get(), 1000);
    }

    #[test]
    fn malformed_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ \"max_features\": 0 }").unwrap();
        assert!(matches!(
            load_settings(&path),
            Err(SessionError::Settings(_))
        ));
    }

    #[test]
    fn run_without_usable_frames() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![dir.path().join("a.jpg"), dir.path().join("b.jpg")];
        assert!(matches!(
            estimate_run(&Settings::default(), images),
            Err(SessionError::Speed(ground_speed::Error::NoSamplesCollected))
        ));
    }
}
