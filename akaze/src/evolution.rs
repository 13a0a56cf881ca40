use crate::{fed_tau, Akaze, GrayFloatImage};
use log::*;

/// Sides shorter than this are too small to detect features on.
const MIN_LEVEL_SIDE: u32 = 40;
/// Octaves with a side shorter than this get a single sublevel.
const FULL_OCTAVE_SIDE: u32 = 80;

/// One level of the nonlinear scale space.
#[derive(Debug)]
#[allow(non_snake_case)]
pub struct EvolutionStep {
    /// Evolution time.
    pub etime: f64,
    /// Evolution sigma. For linear diffusion t = sigma^2 / 2.
    pub esigma: f64,
    pub octave: u32,
    pub sublevel: u32,
    /// Evolution image.
    pub Lt: GrayFloatImage,
    /// Smoothed image.
    pub Lsmooth: GrayFloatImage,
    /// First order spatial derivatives.
    pub Lx: GrayFloatImage,
    pub Ly: GrayFloatImage,
    /// Second order spatial derivatives.
    pub Lxx: GrayFloatImage,
    pub Lyy: GrayFloatImage,
    pub Lxy: GrayFloatImage,
    /// Diffusivity.
    pub Lflow: GrayFloatImage,
    /// Detector response.
    pub Ldet: GrayFloatImage,
    /// FED step sizes that take the previous level to this one.
    pub fed_tau_steps: Vec<f64>,
}

impl EvolutionStep {
    fn new(octave: u32, sublevel: u32, options: &Akaze) -> EvolutionStep {
        let esigma = options.base_scale_offset
            * 2.0f64.powf(f64::from(sublevel) / f64::from(options.num_sublevels) + f64::from(octave));
        EvolutionStep {
            etime: 0.5 * esigma * esigma,
            esigma,
            octave,
            sublevel,
            Lt: GrayFloatImage::new(0, 0),
            Lsmooth: GrayFloatImage::new(0, 0),
            Lx: GrayFloatImage::new(0, 0),
            Ly: GrayFloatImage::new(0, 0),
            Lxx: GrayFloatImage::new(0, 0),
            Lyy: GrayFloatImage::new(0, 0),
            Lxy: GrayFloatImage::new(0, 0),
            Lflow: GrayFloatImage::new(0, 0),
            Ldet: GrayFloatImage::new(0, 0),
            fed_tau_steps: vec![],
        }
    }
}

impl Akaze {
    /// Lays out the scale space for a `width`×`height` image and computes the
    /// FED step sizes between consecutive levels.
    ///
    /// The result is empty when the image is too small for even one octave.
    pub fn allocate_evolutions(&self, width: u32, height: u32) -> Vec<EvolutionStep> {
        let mut evolutions: Vec<EvolutionStep> = (0..self.max_octave_evolution)
            .map_while(|octave| {
                let smallest_side = width.min(height) >> octave;
                if smallest_side < MIN_LEVEL_SIDE {
                    return None;
                }
                let sublevels = if smallest_side < FULL_OCTAVE_SIDE {
                    1
                } else {
                    self.num_sublevels
                };
                Some((0..sublevels).map(move |sublevel| EvolutionStep::new(octave, sublevel, self)))
            })
            .flatten()
            .collect();
        // Earlier FED steps are smaller because they are less stable.
        for i in 1..evolutions.len() {
            let ttime = evolutions[i].etime - evolutions[i - 1].etime;
            evolutions[i].fed_tau_steps = fed_tau::fed_tau_by_process_time(ttime, 1, 0.25, true);
            trace!(
                "{} FED steps into evolution {}",
                evolutions[i].fed_tau_steps.len(),
                i
            );
        }
        evolutions
    }
}

#[cfg(test)]
mod tests {
    use crate::Akaze;

    #[test]
    fn small_octaves_are_skipped() {
        let akaze = Akaze::default();
        assert!(akaze.allocate_evolutions(39, 500).is_empty());
        // 60 px: one sublevel at octave 0, nothing at 30 px.
        assert_eq!(akaze.allocate_evolutions(60, 60).len(), 1);
        // 200 px: 4 + 4 (100 px) + 1 (50 px).
        let evolutions = akaze.allocate_evolutions(200, 300);
        assert_eq!(evolutions.len(), 9);
        assert_eq!(evolutions[8].octave, 2);
    }

    #[test]
    fn evolution_times_increase() {
        let evolutions = Akaze::default().allocate_evolutions(200, 200);
        assert!(evolutions[0].fed_tau_steps.is_empty());
        for pair in evolutions.windows(2) {
            assert!(pair[1].etime > pair[0].etime);
            assert!(!pair[1].fed_tau_steps.is_empty());
        }
    }
}
