use crate::{Akaze, Descriptor, Error, EvolutionStep, KeyPoint};

/// Relative sample sizes of the three MLDB grids (2×2, 3×3 and 4×4 cells).
const GRID_SCALES: [f32; 3] = [1.0, 2.0 / 3.0, 1.0 / 2.0];
const MAX_CHANNELS: usize = 3;

impl Akaze {
    /// Computes the MLDB descriptor of every keypoint.
    ///
    /// Keypoints whose sampling pattern leaves their evolution are dropped,
    /// so the returned keypoints are a subset of `keypoints` in the same
    /// order, each paired with the descriptor at the same index.
    pub fn extract_descriptors(
        &self,
        evolutions: &[EvolutionStep],
        keypoints: &[KeyPoint],
    ) -> (Vec<KeyPoint>, Vec<Descriptor>) {
        keypoints
            .iter()
            .filter_map(|&keypoint| {
                let descriptor = self.get_mldb_descriptor(&keypoint, evolutions).ok()?;
                Some((keypoint, descriptor))
            })
            .unzip()
    }

    /// The rotation invariant M-LDB descriptor of `keypoint`.
    fn get_mldb_descriptor(
        &self,
        keypoint: &KeyPoint,
        evolutions: &[EvolutionStep],
    ) -> Result<Descriptor, Error> {
        debug_assert!(self.descriptor_channels <= MAX_CHANNELS);
        let mut output = Descriptor::zeros();
        let mut values = [0f32; 16 * MAX_CHANNELS];

        let ratio = (1u32 << keypoint.octave) as f32;
        let pattern = SamplePattern {
            scale: f32::round(0.5 * keypoint.size / ratio),
            xf: keypoint.point.0 / ratio,
            yf: keypoint.point.1 / ratio,
            co: f32::cos(keypoint.angle),
            si: f32::sin(keypoint.angle),
        };
        let evolution = &evolutions[keypoint.class_id];
        let pattern_size = self.descriptor_pattern_size as f32;

        let mut bit = 0usize;
        for (grid, multiplier) in GRID_SCALES.iter().enumerate() {
            let cells = (grid + 2) * (grid + 2);
            let sample_step = f32::ceil(pattern_size * multiplier) as usize;
            self.mldb_fill_values(&mut values, sample_step, &pattern, evolution)?;
            mldb_binary_comparisons(
                &values,
                output.bytes_mut(),
                cells,
                &mut bit,
                self.descriptor_channels,
            );
        }
        Ok(output)
    }

    /// Averages intensity and rotated gradients over each cell of a grid with
    /// cells `sample_step` samples wide.
    fn mldb_fill_values(
        &self,
        values: &mut [f32],
        sample_step: usize,
        pattern: &SamplePattern,
        evolution: &EvolutionStep,
    ) -> Result<(), Error> {
        let pattern_size = self.descriptor_pattern_size as i32;
        let channels = self.descriptor_channels;
        let (width, height) = (evolution.Lt.width(), evolution.Lt.height());
        let mut position = 0;
        for i in (-pattern_size..pattern_size).step_by(sample_step) {
            for j in (-pattern_size..pattern_size).step_by(sample_step) {
                let mut di = 0f32;
                let mut dx = 0f32;
                let mut dy = 0f32;
                let mut samples = 0usize;
                for k in i..i + sample_step as i32 {
                    for l in j..j + sample_step as i32 {
                        let (x, y) = pattern.sample(k as f32, l as f32);
                        if !(0..width as isize).contains(&x) || !(0..height as isize).contains(&y) {
                            return Err(Error::SampleOutOfBounds { x, y, width, height });
                        }
                        let (x, y) = (x as usize, y as usize);
                        di += evolution.Lt.get(x, y);
                        if channels > 1 {
                            let rx = evolution.Lx.get(x, y);
                            let ry = evolution.Ly.get(x, y);
                            if channels == 2 {
                                dx += f32::sqrt(rx * rx + ry * ry);
                            } else {
                                dx += -rx * pattern.si + ry * pattern.co;
                                dy += rx * pattern.co + ry * pattern.si;
                            }
                        }
                        samples += 1;
                    }
                }
                let samples = samples as f32;
                values[position] = di / samples;
                if channels > 1 {
                    values[position + 1] = dx / samples;
                }
                if channels > 2 {
                    values[position + 2] = dy / samples;
                }
                position += channels;
            }
        }
        Ok(())
    }
}

/// Keypoint placement in the coordinates of its own octave.
struct SamplePattern {
    scale: f32,
    xf: f32,
    yf: f32,
    co: f32,
    si: f32,
}

impl SamplePattern {
    /// The pixel sampled for pattern offset `(k, l)`, rotated by the keypoint angle.
    fn sample(&self, k: f32, l: f32) -> (isize, isize) {
        let y = self.yf + (l * self.co * self.scale + k * self.si * self.scale);
        let x = self.xf + (-l * self.si * self.scale + k * self.co * self.scale);
        (f32::round(x) as isize, f32::round(y) as isize)
    }
}

/// Appends one bit per ordered pair of cells and channel, starting at `*bit`.
fn mldb_binary_comparisons(
    values: &[f32],
    descriptor: &mut [u8],
    cells: usize,
    bit: &mut usize,
    channels: usize,
) {
    for channel in 0..channels {
        for i in 0..cells {
            let ival = values[channels * i + channel];
            for j in (i + 1)..cells {
                if ival > values[channels * j + channel] {
                    descriptor[*bit >> 3] |= 1 << (*bit & 7);
                }
                *bit += 1;
            }
        }
    }
}
