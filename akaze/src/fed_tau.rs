//! Fast Explicit Diffusion step sizes.
//!
//! Grewenig, Weickert, Bruhn: "From box filtering to fast explicit
//! diffusion", DAGM 2010.

use std::f64::consts::PI;

/// Step sizes for `cycles` FED cycles that together reach the stopping time
/// `time`, each step at most `tau_max` times a stability-dependent factor.
///
/// With `reordering` the steps of a cycle are permuted so that large and
/// small steps alternate, which keeps rounding errors bounded.
pub fn fed_tau_by_process_time(time: f64, cycles: i32, tau_max: f64, reordering: bool) -> Vec<f64> {
    fed_tau_by_cycle_time(time / f64::from(cycles), tau_max, reordering)
}

fn fed_tau_by_cycle_time(time: f64, tau_max: f64, reordering: bool) -> Vec<f64> {
    // Least number of steps that reaches `time`.
    let n = (f64::ceil(f64::sqrt(3.0 * time / tau_max + 0.25) - 0.5 - 1.0e-8) + 0.5) as usize;
    if n == 0 {
        return vec![];
    }
    let scale = 3.0 * time / (tau_max * (n * (n + 1)) as f64);
    let c = 1.0 / (4.0 * n as f64 + 2.0);
    let d = scale * tau_max / 2.0;
    let taus: Vec<f64> = (0..n)
        .map(|k| {
            let h = f64::cos(PI * (2.0 * k as f64 + 1.0) * c);
            d / (h * h)
        })
        .collect();
    if reordering && n > 1 {
        kappa_cycle(&taus)
    } else {
        taus
    }
}

/// Permutes `taus` by the kappa cycle with kappa = n / 2 modulo the smallest
/// prime above n.
fn kappa_cycle(taus: &[f64]) -> Vec<f64> {
    let n = taus.len();
    let kappa = n / 2;
    let mut prime = n + 1;
    while !primal::is_prime(prime as u64) {
        prime += 1;
    }
    // k * kappa for k in 1..prime visits every residue 1..prime exactly once.
    (1..prime)
        .map(|k| (k * kappa) % prime)
        .filter(|&residue| residue <= n)
        .map(|residue| taus[residue - 1])
        .collect()
}
