use crate::{derivatives, evolution::EvolutionStep, image::GrayFloatImage, Akaze};
use ndarray::azip;

impl Akaze {
    /// Integer scale of the derivative filters for `evolution`, in pixels of
    /// its own octave.
    fn derivative_sigma_size(&self, evolution: &EvolutionStep) -> u32 {
        let ratio = 2.0f64.powi(evolution.octave as i32);
        f64::round(evolution.esigma * self.derivative_factor / ratio) as u32
    }

    /// Computes the scale-normalized determinant of the Hessian for every
    /// evolution and stores it in `Ldet`.
    #[allow(non_snake_case)]
    pub fn detector_response(&self, evolutions: &mut [EvolutionStep]) {
        for evolution in evolutions.iter_mut() {
            let sigma_size = self.derivative_sigma_size(evolution).max(1);
            evolution.Lx = derivatives::scharr_horizontal(&evolution.Lsmooth, sigma_size);
            evolution.Ly = derivatives::scharr_vertical(&evolution.Lsmooth, sigma_size);
            evolution.Lxx = derivatives::scharr_horizontal(&evolution.Lx, sigma_size);
            evolution.Lyy = derivatives::scharr_vertical(&evolution.Ly, sigma_size);
            evolution.Lxy = derivatives::scharr_vertical(&evolution.Lx, sigma_size);

            let sigma_size_quat = (sigma_size as f32).powi(4);
            evolution.Ldet = GrayFloatImage::new(evolution.Lxx.width(), evolution.Lxx.height());
            azip!((
                Ldet in evolution.Ldet.mut_array2(),
                &Lxx in evolution.Lxx.ref_array2(),
                &Lyy in evolution.Lyy.ref_array2(),
                &Lxy in evolution.Lxy.ref_array2(),
            ) {
                *Ldet = (Lxx * Lyy - Lxy * Lxy) * sigma_size_quat;
            });
        }
    }
}
