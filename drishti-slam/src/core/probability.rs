//! Gaussian density tables and noise sampling.
//!
//! The tables express the positional uncertainty of a stereo range
//! measurement: evidence for an occupied cell is spread over the cells
//! around the ray end, weighted by the table.

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::StandardNormal;

/// Number of standard deviations covered by a lookup table.
const TABLE_SIGMAS: f32 = 3.0;

#[inline]
fn unit_gaussian(x: f32) -> f32 {
    (-0.5 * x * x).exp()
}

fn normalize_sum(table: &mut [f32]) {
    let sum: f32 = table.iter().sum();
    if sum > 0.0 {
        for v in table.iter_mut() {
            *v /= sum;
        }
    }
}

/// Symmetric Gaussian table of `n` entries covering ±3σ.
///
/// Sample `i` is taken at the centre of its bin, so an even `n` has two
/// equal peak entries. Entries sum to 1.
pub fn create_gaussian_lookup(n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    let half = n as f32 / 2.0;
    let mut table: Vec<f32> = (0..n)
        .map(|i| {
            let x = (i as f32 + 0.5 - half) / half * TABLE_SIGMAS;
            unit_gaussian(x)
        })
        .collect();
    normalize_sum(&mut table);
    table
}

/// One-sided Gaussian table of `n` entries covering 0..3σ.
///
/// Strictly decreasing from index 0; entries sum to 1.
pub fn create_half_gaussian_lookup(n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    let mut table: Vec<f32> = (0..n)
        .map(|i| {
            let x = (i as f32 + 0.5) / n as f32 * TABLE_SIGMAS;
            unit_gaussian(x)
        })
        .collect();
    normalize_sum(&mut table);
    table
}

/// Seeded random source for motion noise and resampling.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    rng: SmallRng,
}

impl NoiseGenerator {
    /// Create a new noise generator.
    ///
    /// A seed of 0 draws from OS entropy; any other seed is reproducible.
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_os_rng()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng }
    }

    /// Zero-mean Gaussian sample with the given standard deviation.
    #[inline]
    pub fn gaussian(&mut self, stddev: f32) -> f32 {
        if stddev <= 0.0 || !stddev.is_finite() {
            return 0.0;
        }
        let n: f32 = self.rng.sample(StandardNormal);
        n * stddev
    }

    /// Zero-mean Gaussian sample with the given variance.
    #[inline]
    pub fn sample_normal_distribution(&mut self, variance: f32) -> f32 {
        if variance <= 0.0 {
            return 0.0;
        }
        self.gaussian(variance.sqrt())
    }

    /// Uniform sample in [0, 1).
    #[inline]
    pub fn uniform(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// Returns true with the given probability.
    #[inline]
    pub fn chance(&mut self, probability: f32) -> bool {
        self.uniform() < probability
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}
