use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::math::Matrix;

/// Base seed from the `SEED` environment variable, or 0.
pub fn env_seed() -> u64 {
    std::env::var("SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

/// Deterministic generator for an explicit seed.
pub fn rng_from_seed(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Derive an independent stream from an existing generator.
pub fn fork(rng: &mut impl Rng) -> StdRng {
    StdRng::seed_from_u64(rng.gen())
}

/// `rows x cols` matrix of standard normal samples.
pub fn normal_matrix(rng: &mut impl Rng, rows: usize, cols: usize) -> Matrix {
    let data = (0..rows * cols)
        .map(|_| rng.sample::<f32, _>(StandardNormal))
        .collect();
    Matrix::from_vec(rows, cols, data)
}

/// `rows x cols` matrix of samples drawn uniformly from `[low, high)`.
pub fn uniform_matrix(rng: &mut impl Rng, rows: usize, cols: usize, low: f32, high: f32) -> Matrix {
    let data = (0..rows * cols).map(|_| rng.gen_range(low..high)).collect();
    Matrix::from_vec(rows, cols, data)
}
