//! Capture times from EXIF metadata.

use crate::{Result, SessionError};
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use time::{Date, Month, PrimitiveDateTime, Time};

/// The `DateTimeOriginal` recorded in an image's primary EXIF directory.
pub fn capture_time(path: impl AsRef<Path>) -> Result<PrimitiveDateTime> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let exif = Reader::new().read_from_container(&mut reader)?;
    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .ok_or_else(|| SessionError::MissingTimestamp(path.to_owned()))?;
    match field.value {
        Value::Ascii(ref values) if !values.is_empty() => {
            exif_to_datetime(&exif::DateTime::from_ascii(&values[0])?)
        }
        _ => Err(SessionError::MissingTimestamp(path.to_owned())),
    }
}

/// Drops the sub-second and time zone parts, which cameras rarely fill in.
pub fn exif_to_datetime(datetime: &exif::DateTime) -> Result<PrimitiveDateTime> {
    let date = Date::from_calendar_date(
        i32::from(datetime.year),
        Month::try_from(datetime.month)?,
        datetime.day,
    )?;
    let time = Time::from_hms(datetime.hour, datetime.minute, datetime.second)?;
    Ok(PrimitiveDateTime::new(date, time))
}

/// Whole seconds from `earlier` to `later`, truncated toward zero.
///
/// Out-of-order captures give a negative number; it is up to the caller to
/// reject it.
pub fn elapsed_seconds(earlier: PrimitiveDateTime, later: PrimitiveDateTime) -> i64 {
    (later - earlier).whole_seconds()
}

/// Whole seconds between the capture times of two image files.
pub fn time_difference(earlier: impl AsRef<Path>, later: impl AsRef<Path>) -> Result<i64> {
    Ok(elapsed_seconds(capture_time(earlier)?, capture_time(later)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::experimental::Writer;
    use exif::Field;
    use std::io::Cursor;
    use time::macros::datetime;

    /// Writes a small JPEG whose APP1 segment carries `DateTimeOriginal`.
    fn write_jpeg_with_capture_time(path: &Path, datetime: &str) {
        let field = Field {
            tag: Tag::DateTimeOriginal,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![datetime.as_bytes().to_vec()]),
        };
        let mut writer = Writer::new();
        writer.push_field(&field);
        let mut tiff = Cursor::new(Vec::new());
        writer.write(&mut tiff, false).unwrap();
        let tiff = tiff.into_inner();

        let mut jpeg = Cursor::new(Vec::new());
        image::GrayImage::from_fn(16, 16, |x, y| image::Luma([(x * 16 + y) as u8]))
            .write_to(&mut jpeg, image::ImageOutputFormat::Jpeg(90))
            .unwrap();
        let jpeg = jpeg.into_inner();
        assert_eq!(jpeg[..2], [0xff, 0xd8]);

        let length = u16::try_from(2 + 6 + tiff.len()).unwrap();
        let mut bytes = jpeg[..2].to_vec();
        bytes.extend_from_slice(&[0xff, 0xe1]);
        bytes.extend_from_slice(&length.to_be_bytes());
        bytes.extend_from_slice(b"Exif\0\0");
        bytes.extend_from_slice(&tiff);
        bytes.extend_from_slice(&jpeg[2..]);
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn parses_exif_datetime() {
        let exif = exif::DateTime::from_ascii(b"2024:02:29 23:59:58").unwrap();
        assert_eq!(
            exif_to_datetime(&exif).unwrap(),
            datetime!(2024-02-29 23:59:58)
        );
    }

    #[test]
    fn rejects_impossible_dates() {
        let exif = exif::DateTime {
            year: 2023,
            month: 2,
            day: 30,
            hour: 10,
            minute: 0,
            second: 0,
            nanosecond: None,
            offset: None,
        };
        assert!(matches!(
            exif_to_datetime(&exif),
            Err(SessionError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn elapsed_across_midnight() {
        let before = datetime!(2024-01-01 23:59:58);
        let after = datetime!(2024-01-02 00:00:12);
        assert_eq!(elapsed_seconds(before, after), 14);
    }

    #[test]
    fn elapsed_out_of_order() {
        let noon = datetime!(2024-01-01 12:00:00);
        let later = datetime!(2024-01-01 12:00:10);
        assert_eq!(elapsed_seconds(later, noon), -10);
        assert_eq!(elapsed_seconds(noon, noon), 0);
    }

    #[test]
    fn file_without_exif() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.png");
        image::GrayImage::new(4, 4).save(&path).unwrap();
        assert!(capture_time(&path).is_err());
    }

    #[test]
    fn reads_capture_time_from_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("first.jpg");
        write_jpeg_with_capture_time(&path, "2024:02:29 23:59:58");
        assert_eq!(capture_time(&path).unwrap(), datetime!(2024-02-29 23:59:58));
    }

    #[test]
    fn time_difference_between_jpegs() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.jpg");
        let second = dir.path().join("second.jpg");
        write_jpeg_with_capture_time(&first, "2024:02:29 23:59:58");
        write_jpeg_with_capture_time(&second, "2024:03:01 00:00:09");
        assert_eq!(time_difference(&first, &second).unwrap(), 11);
        assert_eq!(time_difference(&second, &first).unwrap(), -11);
        // The pixels still decode after the inserted segment.
        let image = image::open(&second).unwrap().into_luma8();
        assert_eq!(image.dimensions(), (16, 16));
    }
}
