//! # Ground speed
//!
//! Estimates the ground-track speed of an orbiting camera from two
//! photographs of the surface taken a known time apart.
//!
//! The estimate is built in four steps, each in its own module:
//!
//! 1. [`FeatureMatcher`]: AKAZE keypoints are detected in both images and
//!    their binary descriptors are matched by Hamming distance. Only matches
//!    that are each other's best match in both directions survive.
//! 2. [`DisplacementEstimator`]: every match is resolved to a pair of pixel
//!    positions and the distances between them are averaged.
//! 3. [`speed_km_per_sec`]: the displacement is scaled by the ground sample
//!    distance (centimetres per pixel) and divided by the elapsed time.
//! 4. [`Pipeline`] runs the three steps for one pair and collects the speeds
//!    of a whole run in a [`RunAccumulator`], whose mean is the result.
//!
//! ```text
//!   image A ─┐
//!            ├─ match ─ correspondences ─ displacement (px) ─ speed (km/s) ─ accumulator
//!   image B ─┘
//! ```
//!
//! Settings for a run live in [`Settings`], which can build a ready
//! AKAZE-backed [`Pipeline`].

mod accumulator;
mod displacement;
mod error;
pub mod geometry;
mod matcher;
mod pipeline;
mod settings;
mod speed;

pub use accumulator::*;
pub use bitarray;
pub use displacement::*;
pub use error::*;
pub use image;
pub use matcher::*;
pub use nalgebra;
pub use pipeline::*;
pub use settings::*;
pub use speed::*;
