use crate::timestamp::capture_time;
use crate::Result;
use image::GrayImage;
use log::*;
use std::path::{Path, PathBuf};
use time::PrimitiveDateTime;

/// One captured photograph.
#[derive(Debug, Clone)]
pub struct Frame {
    pub path: PathBuf,
    pub image: GrayImage,
    pub captured_at: PrimitiveDateTime,
}

impl Frame {
    /// Loads the image as grayscale along with its EXIF capture time.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let captured_at = capture_time(path)?;
        let image = load_grayscale(path)?;
        Ok(Self {
            path: path.to_owned(),
            image,
            captured_at,
        })
    }
}

/// Opens any image format the `image` crate can decode as 8-bit grayscale.
pub fn load_grayscale(path: impl AsRef<Path>) -> Result<GrayImage> {
    let image = image::open(path)?.into_luma8();
    debug!("loaded a {} x {} image", image.width(), image.height());
    Ok(image)
}

/// Replays already captured photographs in the order given.
///
/// The order is trusted to be the capture order; frames are not re-sorted by
/// timestamp.
#[derive(Debug, Clone)]
pub struct FileReplay {
    paths: std::vec::IntoIter<PathBuf>,
}

impl FileReplay {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect::<Vec<_>>().into_iter(),
        }
    }
}

impl Iterator for FileReplay {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        trace!("loading {}", path.display());
        Some(Frame::load(path))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.paths.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionError;

    #[test]
    fn grayscale_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("color.png");
        image::RgbImage::from_pixel(5, 3, image::Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();
        let gray = load_grayscale(&path).unwrap();
        assert_eq!(gray.dimensions(), (5, 3));
        assert_eq!(gray.get_pixel(2, 1)[0], 255);
    }

    #[test]
    fn missing_file_is_an_error_item() {
        let dir = tempfile::tempdir().unwrap();
        let mut replay = FileReplay::new(vec![dir.path().join("nope.jpg")]);
        assert_eq!(replay.size_hint(), (1, Some(1)));
        assert!(matches!(replay.next(), Some(Err(SessionError::Io(_)))));
        assert!(replay.next().is_none());
    }
}
