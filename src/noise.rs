//! Seedable noise source for sensor models and random marker placement.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    rng: ChaCha8Rng,
}

impl NoiseGenerator {
    /// A seed of 0 draws the seed from OS entropy, any other value gives a reproducible stream.
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            ChaCha8Rng::from_os_rng()
        } else {
            ChaCha8Rng::seed_from_u64(seed)
        };
        Self { rng }
    }

    /// Zero-mean Gaussian sample. A zero standard deviation consumes no randomness.
    pub fn gaussian(&mut self, stddev: f64) -> f64 {
        if stddev == 0.0 {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * stddev
    }

    /// Uniform sample in `[low, high)`, or `low` when the interval is empty.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.random_range(low..high)
    }
}
