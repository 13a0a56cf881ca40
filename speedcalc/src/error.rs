use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to load image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to read EXIF metadata: {0}")]
    Exif(#[from] exif::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{} has no DateTimeOriginal tag", .0.display())]
    MissingTimestamp(PathBuf),
    #[error("capture time is not a valid date: {0}")]
    InvalidTimestamp(#[from] time::error::ComponentRange),
    #[error("failed to parse settings: {0}")]
    Settings(#[from] serde_json::Error),
    #[error(transparent)]
    Speed(#[from] ground_speed::Error),
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
