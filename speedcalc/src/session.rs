use crate::replay::Frame;
use crate::timestamp::elapsed_seconds;
use crate::Result;
use ground_speed::{DisplacementEstimator, FeatureMatcher, Pipeline, RunAccumulator};
use log::*;

/// Runs every consecutive pair of frames through `pipeline`.
///
/// Frames that failed to load are logged and dropped, so the next good frame
/// is paired with the last good one. Pairs the pipeline rejects contribute no
/// sample.
pub fn run_session<M, E, I>(pipeline: &Pipeline<M, E>, frames: I) -> RunAccumulator
where
    M: FeatureMatcher,
    E: DisplacementEstimator,
    I: IntoIterator<Item = Result<Frame>>,
{
    let mut accumulator = RunAccumulator::new();
    let mut previous: Option<Frame> = None;
    let mut pairs = 0usize;
    for frame in frames {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!("dropping frame: {}", e);
                continue;
            }
        };
        if let Some(earlier) = previous.take() {
            pairs += 1;
            let elapsed = elapsed_seconds(earlier.captured_at, frame.captured_at);
            info!(
                "pair {}: {} -> {}, {} s apart",
                pairs,
                earlier.path.display(),
                frame.path.display(),
                elapsed
            );
            // Failures are already logged by the pipeline.
            let _ = pipeline.accumulate(
                &mut accumulator,
                &earlier.image,
                &frame.image,
                elapsed as f64,
            );
        }
        previous = Some(frame);
    }
    info!(
        "collected {} speed samples from {} pairs",
        accumulator.len(),
        pairs
    );
    accumulator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionError;
    use ground_speed::bitarray::BitArray;
    use ground_speed::image::GrayImage;
    use ground_speed::nalgebra::Point2;
    use ground_speed::{Correspondence, FeatureMatches, Keypoint, MeanDisplacement};
    use std::path::PathBuf;
    use time::macros::datetime;
    use time::PrimitiveDateTime;

    /// Every pair shows one feature that moved by (6, 8).
    struct Shifted;

    impl FeatureMatcher for Shifted {
        fn match_features(&self, _: &GrayImage, _: &GrayImage) -> FeatureMatches {
            let keypoint = |x, y| Keypoint {
                point: Point2::new(x, y),
                response: 1.0,
                descriptor: BitArray::zeros(),
            };
            FeatureMatches {
                correspondences: vec![Correspondence::new(0, 0, 0)],
                keypoints_a: vec![keypoint(20.0, 20.0)],
                keypoints_b: vec![keypoint(26.0, 28.0)],
            }
        }
    }

    fn frame(name: &str, captured_at: PrimitiveDateTime) -> Result<Frame> {
        Ok(Frame {
            path: PathBuf::from(name),
            image: GrayImage::new(4, 4),
            captured_at,
        })
    }

    #[test]
    fn consecutive_pairs() {
        // One pixel covers a kilometre, so every pair moves 10 km.
        let pipeline = Pipeline::new(Shifted, MeanDisplacement, 100_000.0);
        let frames = vec![
            frame("image_1.jpg", datetime!(2024-05-01 12:00:00)),
            frame("image_2.jpg", datetime!(2024-05-01 12:00:04)),
            // Duplicate timestamp: the pair is skipped.
            frame("image_3.jpg", datetime!(2024-05-01 12:00:04)),
            Err(SessionError::MissingTimestamp(PathBuf::from("image_4.jpg"))),
            frame("image_5.jpg", datetime!(2024-05-01 12:00:09)),
        ];
        let accumulator = run_session(&pipeline, frames);
        assert_eq!(accumulator.samples(), &[2.5, 2.0]);
        assert_eq!(accumulator.finalize(), Ok(2.25));
    }

    #[test]
    fn single_frame_collects_nothing() {
        let pipeline = Pipeline::new(Shifted, MeanDisplacement, 12648.0);
        let accumulator = run_session(
            &pipeline,
            vec![frame("image_1.jpg", datetime!(2024-05-01 12:00:00))],
        );
        assert_eq!(
            accumulator.finalize(),
            Err(ground_speed::Error::NoSamplesCollected)
        );
    }
}
