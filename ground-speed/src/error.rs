use thiserror::Error;

/// Failures surfaced by the speed pipeline.
///
/// Everything except [`Error::NoSamplesCollected`] is local to a single image
/// pair: the pair is skipped and the run goes on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("no correspondences survived cross-checking")]
    EmptyCorrespondenceSet,
    #[error("elapsed time between captures must be positive, got {0} s")]
    InvalidElapsedTime(f64),
    #[error("ground sample distance must be finite and positive, got {0} cm/px")]
    InvalidGroundSampleDistance(f64),
    #[error("displacement must be finite and non-negative, got {0} px")]
    InvalidDisplacement(f64),
    #[error("correspondence refers to keypoint {index} of image {image}, which has {len} keypoints")]
    CorrespondenceOutOfRange {
        image: char,
        index: usize,
        len: usize,
    },
    #[error("no speed samples were collected during the run")]
    NoSamplesCollected,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
