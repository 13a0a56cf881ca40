use approx::assert_relative_eq;
use core::num::NonZeroUsize;
use ground_speed::image::{GrayImage, Luma};
use ground_speed::{FeatureMatcher, RunAccumulator, Settings};
use log::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

const GSD: f64 = 12648.0;
const SIDE: u32 = 200;
const MARGIN: u32 = 15;

/// A field of randomly placed Gaussian blobs, bright and dark, on mid gray.
struct Texture {
    blobs: Vec<(f64, f64, f64, f64)>,
}

impl Texture {
    fn random(seed: u64) -> Self {
        let mut rng = Pcg64::seed_from_u64(seed);
        let extent = f64::from(SIDE + 2 * MARGIN);
        let blobs = (0..280)
            .map(|_| {
                let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                (
                    rng.gen_range(0.0..extent),
                    rng.gen_range(0.0..extent),
                    rng.gen_range(1.5..4.0),
                    sign * rng.gen_range(0.25..0.6),
                )
            })
            .collect();
        Self { blobs }
    }

    fn intensity(&self, x: f64, y: f64) -> f64 {
        let value: f64 = self
            .blobs
            .iter()
            .map(|&(cx, cy, sigma, amplitude)| {
                let d2 = (x - cx).powi(2) + (y - cy).powi(2);
                amplitude * (-d2 / (2.0 * sigma * sigma)).exp()
            })
            .sum();
        (0.5 + value).clamp(0.0, 1.0)
    }

    /// A `SIDE`×`SIDE` view whose top-left corner sits at `(left, top)` on the texture.
    fn view(&self, left: u32, top: u32) -> GrayImage {
        GrayImage::from_fn(SIDE, SIDE, |x, y| {
            let value = self.intensity(f64::from(x + left), f64::from(y + top));
            Luma([(value * 255.0).round() as u8])
        })
    }
}

fn dense_settings() -> Settings {
    Settings {
        akaze_threshold: 0.0001,
        ground_sample_distance: GSD,
        ..Default::default()
    }
}

#[test]
fn identical_images_have_zero_speed() {
    let _ = pretty_env_logger::try_init();
    let image = Texture::random(3).view(MARGIN, MARGIN);
    let pipeline = dense_settings().pipeline();

    let matches = pipeline.matcher().match_features(&image, &image);
    info!("{} self matches", matches.correspondences.len());
    assert!(!matches.is_empty());

    assert_eq!(pipeline.displacement(&image, &image), Ok(0.0));
    assert_eq!(pipeline.process_pair(&image, &image, 4.0), Ok(0.0));
}

#[test]
fn shifted_texture() {
    let _ = pretty_env_logger::try_init();
    let texture = Texture::random(7);
    // Everything seen at (u, v) in the first view is at (u + 6, v + 8) in the second.
    let first = texture.view(MARGIN, MARGIN);
    let second = texture.view(MARGIN - 6, MARGIN - 8);
    let pipeline = dense_settings().pipeline();

    let matches = pipeline.matcher().match_features(&first, &second);
    let on_target = matches
        .correspondences
        .iter()
        .filter(|c| {
            let a = matches.keypoints_a[c.index_a].point;
            let b = matches.keypoints_b[c.index_b].point;
            ((b - a).norm() - 10.0).abs() < 1.0
        })
        .count();
    info!(
        "{} of {} matches moved by 10 px",
        on_target,
        matches.correspondences.len()
    );
    assert!(on_target * 2 > matches.correspondences.len());

    // The ten closest descriptor matches carry the displacement.
    let pipeline = Settings {
        max_matches: NonZeroUsize::new(10),
        ..dense_settings()
    }
    .pipeline();
    let displacement = pipeline.displacement(&first, &second).unwrap();
    info!("displacement {} px", displacement);
    assert!((displacement - 10.0).abs() < 0.5);

    // 10 px * 12648 cm/px over 4 s.
    let speed = pipeline.process_pair(&first, &second, 4.0).unwrap();
    let expected = 10.0 * GSD / 100_000.0 / 4.0;
    assert_relative_eq!(expected, 0.3162, epsilon = 1e-12);
    assert_relative_eq!(speed, expected, epsilon = 0.016);
}

#[test]
fn run_over_several_pairs() {
    let _ = pretty_env_logger::try_init();
    let texture = Texture::random(11);
    let frames = [
        texture.view(MARGIN, MARGIN),
        texture.view(MARGIN - 6, MARGIN - 8),
        texture.view(MARGIN - 6, MARGIN - 8),
    ];
    let pipeline = dense_settings().pipeline();
    let mut accumulator = RunAccumulator::new();
    for pair in frames.windows(2) {
        let _ = pipeline.accumulate(&mut accumulator, &pair[0], &pair[1], 4.0);
    }
    // A zero elapsed time is rejected without touching the collected samples.
    assert!(pipeline
        .accumulate(&mut accumulator, &frames[0], &frames[1], 0.0)
        .is_err());
    assert_eq!(accumulator.len(), 2);
    assert_eq!(accumulator.samples()[1], 0.0);
    let moving = accumulator.samples()[0];
    assert!(moving > 0.0);
    assert_relative_eq!(accumulator.finalize().unwrap(), moving / 2.0);
}
